//! Built-in verbs. Each handler is a unit struct registered under its verb in
//! [`register_defaults`]; adding a verb never touches the interpreter.

use shared::error::CoreError;
use topology::{LocationRef, Topology};

use crate::registry::{CommandRegistry, RegistryError};

mod dispense;
mod move_plate;
mod queries;
mod shift_plates;
mod unload;
mod unsupported;

pub use dispense::Dispense;
pub use move_plate::MovePlate;
pub use queries::{DumpStops, GetStack, GetTrack, HasPlate, ListCommands, Version, WhereIs};
pub use shift_plates::ShiftPlates;
pub use unload::Unload;
pub use unsupported::NotImplemented;

/// The device vocabulary this simulator recognises without modelling. Each
/// verb answers `9999` with no state change.
pub const UNSIMULATED_VERBS: &[&str] = &[
    // diagnostics
    "CLEARCOUNTER", "CLEARCOUNTERS", "DUMPINPUTSTATE", "DUMPOUTPUTSTATE", "GETFILEDATA",
    "GETFILELIST", "GETFILESIZE", "GETLOOPCOUNTER", "GETSTACKSENSORS", "GETSTOPCONTROLSTATES",
    "GETSTOPOUTPUTSTATES", "GETSTOPSENSORS", "INCREMENTCOUNTER", "LISTCOUNTERS",
    "LISTLABLINXEXCEPTION", "LISTMETRICS", "LISTRAWMETRICS", "MOVEPLATETEST", "TESTLIFT",
    "TESTSTOPS",
    // hardware management
    "GETCLOCKTIME", "GETCLOCKTIMEZONE", "GETCPUINFO", "GETDISKINFO", "GETFIRMWAREUPTIME",
    "GETMEMORYUSAGE", "GETOSINFO", "GETSYSTEMUPTIME", "GETUPTIME", "LISTCLOCKTIMEZONES",
    "LISTCOMPORTS", "SENDTO", "SETCLOCKTIME", "SETCLOCKTIMEZONE", "SHUTDOWN", "TERMINAL",
    // logging
    "GETLOGLEVEL", "GETLOGPATH", "LISTBOOTLOG", "LISTLOG", "LISTLOGSOURCES", "LOGCOMMANDS",
    "SETLOGLEVEL",
    // direct i/o
    "LISTIOS", "READANALOG", "READINP", "READINPUT", "WRITEANALOG", "WRITEOUT", "WRITEOUTPUT",
    // movement
    "CALCULATEMOVESPEED", "CALCULATEMOVETIME", "ESTOP", "GETAUTOHOME", "GETPOS", "GETPOSITION",
    "GETSPEED", "HALT", "HOME", "JOG", "MOVE", "MOVE_ABS", "MOVEAXES", "MOVEAXIS", "MOVEFAST",
    "SETAUTOHOME", "SETSPEED", "SHIFTEDMOVE", "STATUS",
    // lift commands
    "RETURN",
    // meta commands
    "CAN", "DELETESETTINGSFILE", "GETSERIALNUMBER", "GETSETTINGS", "LISTPARAMETERS",
    "LISTPARAMS", "LISTSETTINGS",
    // plate movement
    "ACKNOWLEDGESEND", "COMPOUNDSHIFT", "CONVEYOROFF", "CONVEYORON", "GETIGNORESTOP",
    "GETIGNORESTOPS", "IGNOREALLSTOPS", "IGNORESTOP", "IGNORESTOPRANGE", "RECEIVEPLATE",
    "SENDPLATE",
    // motor configuration
    "CLEARMOTIONOVERRIDES", "DELETEMOTIONPROFILE", "GETAXES", "GETAXISPROFILE",
    "GETDEFAULTMOTION", "GETESTOPAXES", "GETHOMEMOTION", "GETLIMITS", "GETMOTIONPROFILE",
    "GETPRIMARYAXES", "GETSECONDARYAXES", "GETSTEPSPERUNIT", "GETSYNCHRONIZEMOTION",
    "LISTAXISPROFILES", "LISTDEFAULTMOTIONS", "LISTHOMEMOTIONS", "LISTMOTIONPROFILES",
    "SETAXISPROFILE", "SETDEFAULTMOTION", "SETESTOPAXES", "SETHOMEMOTION", "SETLIMITS",
    "SETMOTIONPROFILE", "SETSYNCHRONIZEMOTION",
    // network configuration
    "GETCURRENTIP", "GETDEFAULTGATEWAY", "GETDNS", "GETHOSTNAME", "GETIP", "GETIPADDRESS",
    "GETSUBNETMASK", "GETUSEDHCP", "LISTNETWORKSETTINGS", "SETDEFAULTGATEWAY", "SETDNS",
    "SETHOSTNAME", "SETIP", "SETIPADDRESS", "SETSUBNETMASK", "SETUSEDHCP",
    // point management
    "ADDCOORDINATES", "CLEARPOINTS", "CONSTRAINPOINT", "DELETEPOINT", "GETPOINT", "HERE",
    "LISTPOINTS", "LOADPOINT", "REMOVECOORDINATES", "SET", "SETSHIFTED", "SHIFT",
    // stop management
    "ADDSTOP", "GETSTOPFLAGS", "GETSTOPNAME", "GETSTOPPORT", "INSERTSTOP", "LISTSTOPS",
    "MOVESTOP", "REMOVEALLSTOPS", "REMOVESTOP", "RENAMESTOP", "SETSTOPFLAGS", "SETSTOPNAME",
    "SETSTOPPORT", "SWAPSTOPS",
    // track configuration
    "GETAUTOSTOP", "GETAUTOSTOPTIME", "GETHIGHSPEEDDISTANCE", "GETMOVETIME", "GETNUMTRACKS",
    "GETPARTNERS", "GETSHIFTTIMEOUT", "GETTRACKSETTINGS", "LISTTRACKSETTINGS", "SENDTOPARTNER",
    "SETAUTOSTOP", "SETAUTOSTOPTIME", "SETHIGHSPEEDDISTANCE", "SETMOVETIME", "SETPARTNERS",
    "SETSHIFTTIMEOUT", "SETTRACKSETTINGS",
];

pub fn register_defaults(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.register("DISPENSE", Dispense)?;
    registry.register("MOVEPLATE", MovePlate)?;
    registry.register("SHIFTPLATES", ShiftPlates)?;
    registry.register("UNLOAD", Unload)?;
    registry.register("HASPLATE", HasPlate)?;
    registry.register("GETSTACK", GetStack)?;
    registry.register("GETTRACK", GetTrack)?;
    registry.register("DUMPSTOPS", DumpStops)?;
    registry.register("WHEREIS", WhereIs)?;
    registry.register("LISTCOMMANDS", ListCommands)?;
    registry.register("VERSION", Version)?;
    for verb in UNSIMULATED_VERBS {
        registry.register(verb, NotImplemented)?;
    }
    Ok(())
}

pub(crate) fn expect_stop(topology: &Topology, address: &str) -> Result<LocationRef, CoreError> {
    match topology.resolve(address)? {
        stop @ LocationRef::Stop(_) => Ok(stop),
        other => Err(wrong_kind(topology, address, "stop", other)),
    }
}

pub(crate) fn expect_stack(topology: &Topology, address: &str) -> Result<usize, CoreError> {
    match topology.resolve(address)? {
        LocationRef::Stack(i) => Ok(i),
        other => Err(wrong_kind(topology, address, "stack", other)),
    }
}

/// A whole track; a slot address is rejected.
pub(crate) fn expect_track(topology: &Topology, address: &str) -> Result<usize, CoreError> {
    match topology.resolve(address)? {
        LocationRef::Track(i) => Ok(i),
        other => Err(wrong_kind(topology, address, "track", other)),
    }
}

fn wrong_kind(topology: &Topology, address: &str, wanted: &str, found: LocationRef) -> CoreError {
    CoreError::not_found(format!(
        "no {wanted} named '{address}', it is the {}",
        topology.describe(found)
    ))
}

pub(crate) fn join_plates<I, T>(plates: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let joined: Vec<String> = plates.into_iter().map(|p| p.to_string()).collect();
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined.join(",")
    }
}
