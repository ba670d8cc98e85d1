use shared::{
    domain::{Direction, PlateId},
    error::CoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A location id, slot address or selector. Existence is checked by the
    /// handler, not here.
    Location,
    Direction,
    Plate,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Required,
    Optional,
    /// Zero or more trailing values; must be last.
    Rest,
}

/// One ordered field of a verb's argument schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    arity: Arity,
}

impl ArgSpec {
    pub const fn required(name: &'static str, kind: ArgKind) -> Self {
        Self {
            name,
            kind,
            arity: Arity::Required,
        }
    }

    pub const fn optional(name: &'static str, kind: ArgKind) -> Self {
        Self {
            name,
            kind,
            arity: Arity::Optional,
        }
    }

    pub const fn rest(name: &'static str) -> Self {
        Self {
            name,
            kind: ArgKind::Text,
            arity: Arity::Rest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Location(String),
    Direction(Direction),
    Plate(PlateId),
    Text(String),
}

/// Arguments validated against a schema; accessors index the schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    values: Vec<ArgValue>,
}

impl Args {
    /// Splits `raw` on commas and checks count and field types. Blank input
    /// means no arguments.
    pub fn parse(verb: &str, schema: &[ArgSpec], raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        let fields: Vec<&str> = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split(',').map(str::trim).collect()
        };

        let required = schema
            .iter()
            .filter(|s| s.arity == Arity::Required)
            .count();
        let variadic = schema.last().is_some_and(|s| s.arity == Arity::Rest);
        let too_many = !variadic && fields.len() > schema.len();
        if fields.len() < required || too_many {
            return Err(CoreError::malformed(format!(
                "{verb} expects {}, got {}",
                describe_schema(schema),
                fields.len()
            )));
        }

        let mut values = Vec::with_capacity(fields.len());
        for (position, field) in fields.into_iter().enumerate() {
            let spec = schema
                .get(position)
                .or_else(|| schema.last())
                .ok_or_else(|| CoreError::malformed(format!("{verb} takes no arguments")))?;
            values.push(parse_field(verb, spec, field)?);
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[ArgValue] {
        &self.values
    }

    pub fn location(&self, index: usize) -> Result<&str, CoreError> {
        self.optional_location(index)
            .ok_or_else(|| missing(index, "location"))
    }

    pub fn optional_location(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(ArgValue::Location(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn direction(&self, index: usize) -> Result<Direction, CoreError> {
        match self.values.get(index) {
            Some(ArgValue::Direction(direction)) => Ok(*direction),
            _ => Err(missing(index, "direction")),
        }
    }

    pub fn plate(&self, index: usize) -> Result<PlateId, CoreError> {
        match self.values.get(index) {
            Some(ArgValue::Plate(plate)) => Ok(*plate),
            _ => Err(missing(index, "plate")),
        }
    }
}

fn missing(index: usize, what: &str) -> CoreError {
    CoreError::malformed(format!("argument {} is not a {what}", index + 1))
}

fn parse_field(verb: &str, spec: &ArgSpec, field: &str) -> Result<ArgValue, CoreError> {
    if field.is_empty() && spec.arity != Arity::Rest {
        return Err(CoreError::malformed(format!(
            "{verb}: argument '{}' is empty",
            spec.name
        )));
    }
    match spec.kind {
        ArgKind::Location => {
            if field.chars().any(char::is_whitespace) {
                Err(CoreError::malformed(format!(
                    "{verb}: {} '{field}' contains whitespace",
                    spec.name
                )))
            } else {
                Ok(ArgValue::Location(field.to_string()))
            }
        }
        ArgKind::Direction => field
            .parse()
            .map(ArgValue::Direction)
            .map_err(|e| CoreError::malformed(format!("{verb}: {e}"))),
        ArgKind::Plate => field
            .parse()
            .map(ArgValue::Plate)
            .map_err(|e| CoreError::malformed(format!("{verb}: {e}"))),
        ArgKind::Text => Ok(ArgValue::Text(field.to_string())),
    }
}

fn describe_schema(schema: &[ArgSpec]) -> String {
    if schema.is_empty() {
        return "no arguments".to_string();
    }
    let fields: Vec<String> = schema
        .iter()
        .map(|spec| match spec.arity {
            Arity::Required => spec.name.to_string(),
            Arity::Optional => format!("[{}]", spec.name),
            Arity::Rest => format!("[{}...]", spec.name),
        })
        .collect();
    format!("({})", fields.join(","))
}

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod tests;
