use std::{path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::protocol::{parse_status_line, StateEnvelope, StatusLine, END_OF_LIST};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time::timeout,
};

#[derive(Parser, Debug)]
struct Cli {
    /// Command port of a running simulator.
    #[arg(long, default_value = "127.0.0.1:7000")]
    addr: String,
    /// Dashboard base URL, used by `state`.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    dashboard_url: String,
    /// How long a listing verb may go quiet before its listing counts as
    /// finished.
    #[arg(long, default_value_t = 150)]
    listing_wait_ms: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one command line and print the response.
    Send { line: Vec<String> },
    /// Send every line of a script; lines starting with `#` are comments.
    Run {
        script: PathBuf,
        #[arg(long)]
        stop_on_error: bool,
    },
    /// Fetch the dashboard's state snapshot.
    State,
    /// Parse and validate a layout file without starting anything.
    CheckLayout { path: PathBuf },
}

struct Connection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    listing_wait: Duration,
}

struct Reply {
    echo: String,
    status: StatusLine,
    raw_status: String,
    lines: Vec<String>,
}

impl Connection {
    async fn open(addr: &str, listing_wait: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to {addr}"))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
            listing_wait,
        })
    }

    async fn request(&mut self, line: &str) -> Result<Reply> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;

        let echo = self.required_line().await?;
        let raw_status = self.required_line().await?;
        let Some(status) = parse_status_line(&raw_status) else {
            bail!("unexpected status line '{raw_status}'");
        };

        let mut lines = Vec::new();
        if !(succeeded(&status) && returns_listing(&echo)) {
            return Ok(Reply {
                echo,
                status,
                raw_status,
                lines,
            });
        }
        // An empty listing sends no `End of List`, hence the timeout.
        while let Ok(next) = timeout(self.listing_wait, self.lines.next_line()).await {
            match next? {
                Some(extra) if extra == END_OF_LIST => break,
                Some(extra) => lines.push(extra),
                None => break,
            }
        }
        Ok(Reply {
            echo,
            status,
            raw_status,
            lines,
        })
    }

    async fn required_line(&mut self) -> Result<String> {
        self.lines
            .next_line()
            .await?
            .context("simulator closed the connection")
    }
}

fn print_reply(reply: &Reply) {
    println!("> {}", reply.echo);
    println!("{}", reply.raw_status);
    for line in &reply.lines {
        println!("  {line}");
    }
}

/// Verbs whose successful reply carries listing lines.
const LISTING_VERBS: &[&str] = &["DUMPSTOPS", "LISTCOMMANDS"];

fn returns_listing(echo: &str) -> bool {
    echo.split_whitespace()
        .next()
        .is_some_and(|verb| LISTING_VERBS.iter().any(|v| v.eq_ignore_ascii_case(verb)))
}

fn succeeded(status: &StatusLine) -> bool {
    status.code.is_some_and(|code| code.is_ok())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let listing_wait = Duration::from_millis(cli.listing_wait_ms);

    match cli.command {
        Command::Send { line } => {
            let line = line.join(" ");
            if line.trim().is_empty() {
                bail!("nothing to send");
            }
            let mut conn = Connection::open(&cli.addr, listing_wait).await?;
            let reply = conn.request(&line).await?;
            print_reply(&reply);
            if !succeeded(&reply.status) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Run {
            script,
            stop_on_error,
        } => {
            let raw = tokio::fs::read_to_string(&script)
                .await
                .with_context(|| format!("failed to read {}", script.display()))?;
            let mut conn = Connection::open(&cli.addr, listing_wait).await?;
            let mut failures = 0usize;
            for line in script_lines(&raw) {
                let reply = conn.request(line).await?;
                print_reply(&reply);
                if !succeeded(&reply.status) {
                    failures += 1;
                    if stop_on_error {
                        break;
                    }
                }
            }
            if failures > 0 {
                eprintln!("{failures} command(s) failed");
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::State => {
            let url = format!("{}/api/state", cli.dashboard_url.trim_end_matches('/'));
            let envelope: StateEnvelope = reqwest::get(&url)
                .await
                .with_context(|| format!("failed to reach {url}"))?
                .error_for_status()?
                .json()
                .await
                .context("dashboard returned an unexpected body")?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::CheckLayout { path } => {
            let topology = topology::load_layout(&path)
                .with_context(|| format!("invalid layout {}", path.display()))?;
            println!(
                "{}: {} stops, {} stacks, {} tracks",
                path.display(),
                topology.stops().len(),
                topology.stacks().len(),
                topology.tracks().len()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Script lines worth sending. `#` only opens a comment at the start of a
/// line, since slot addresses use it too.
fn script_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lines_skip_comments_and_blanks() {
        let raw = "# warm up\nDISPENSE C2\n\n  MOVEPLATE C2,T1#2  \n";
        let lines: Vec<&str> = script_lines(raw).collect();
        assert_eq!(lines, vec!["DISPENSE C2", "MOVEPLATE C2,T1#2"]);
    }

    #[test]
    fn only_listing_verbs_wait_for_more_lines() {
        assert!(returns_listing("DUMPSTOPS"));
        assert!(returns_listing("listcommands"));
        assert!(!returns_listing("MOVEPLATE C2,K2"));
        assert!(!returns_listing("HASPLATE C2"));
        assert!(!returns_listing(""));
    }

    #[tokio::test]
    async fn plain_replies_return_without_waiting() {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            while let Some(line) = lines.next_line().await.expect("read") {
                let reply = if line == "DUMPSTOPS" {
                    format!("{line}\r\n0000 OK 1 stops\r\nC2:Empty\r\n{END_OF_LIST}\r\n")
                } else {
                    format!("{line}\r\n0000 OK P1 C2\r\n")
                };
                writer.write_all(reply.as_bytes()).await.expect("write");
            }
        });

        // A listing wait this long would time the test out if it applied.
        let mut conn = Connection::open(&addr, Duration::from_secs(60))
            .await
            .expect("connect");
        let reply = timeout(Duration::from_secs(5), conn.request("DISPENSE C2"))
            .await
            .expect("no listing wait")
            .expect("reply");
        assert_eq!(reply.status.detail, "P1 C2");
        assert!(reply.lines.is_empty());

        let listing = timeout(Duration::from_secs(5), conn.request("DUMPSTOPS"))
            .await
            .expect("ends at End of List")
            .expect("reply");
        assert_eq!(listing.lines, vec!["C2:Empty".to_string()]);
    }

    #[test]
    fn send_arguments_are_joined() {
        let cli = Cli::parse_from(["stacklink", "send", "MOVEPLATE", "C2,K2"]);
        match cli.command {
            Command::Send { line } => assert_eq!(line.join(" "), "MOVEPLATE C2,K2"),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
