use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Words on a calendar page that mark a screening as out of the ordinary.
pub const SPECIAL_EVENT_CUES: &[&str] = &[
    "q&a",
    "premiere",
    "director",
    "in person",
    "special screening",
    "35mm",
    "70mm",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
    OptionalText,
}

impl FieldKind {
    fn json_type(self) -> Value {
        match self {
            FieldKind::Text => json!("string"),
            FieldKind::Flag => json!("boolean"),
            FieldKind::OptionalText => json!(["string", "null"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

/// Declare a record struct together with the field list the completion
/// backend is constrained to, so the two never drift apart.
macro_rules! define_record {
    (
        $(#[$meta:meta])*
        pub struct $record:ident as $schema_name:literal {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty => $kind:ident, $description:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        pub struct $record {
            $(
                $(#[$field_meta])*
                pub $field: $ty
            ),+
        }

        impl $record {
            pub const FIELDS: &'static [Field] = &[
                $(Field {
                    name: stringify!($field),
                    kind: FieldKind::$kind,
                    description: $description,
                }),+
            ];

            pub fn schema() -> EventSchema {
                EventSchema {
                    name: $schema_name,
                    fields: Self::FIELDS,
                }
            }
        }
    };
}

define_record! {
    /// One screening on the calendar page.
    ///
    /// Optional fields are `None` when the page names no guest or format;
    /// they serialize as `null`, which keeps them apart from `Some("")`.
    /// Every key must be present when deserializing, `null` included.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct EventRecord as "screening_events" {
        film_title: String => Text,
            "The title of the film being screened",
        showtime: String => Text,
            "The showtime exactly as written on the page (e.g. 'Fri, Jan 15, 7:00 PM')",
        is_special_event: bool => Flag,
            "True if the screening has a Q&A, a named guest, a premiere, or a special print format such as 35mm or 70mm",
        #[serde(deserialize_with = "Option::deserialize")]
        special_guest: Option<String> => OptionalText,
            "Name of the special guest if one is named (e.g. 'Sean Baker'), otherwise null",
        #[serde(deserialize_with = "Option::deserialize")]
        format: Option<String> => OptionalText,
            "Presentation format if explicitly stated (e.g. '35mm', '70mm', 'DCP'), otherwise null",
    }
}

impl EventRecord {
    /// Whether a special flag is backed by something visible: a guest, a
    /// format, or an explicit cue in `source`. Records not flagged special
    /// are always corroborated.
    pub fn is_corroborated_by(&self, source: &str) -> bool {
        if !self.is_special_event || self.special_guest.is_some() || self.format.is_some() {
            return true;
        }
        let source = source.to_lowercase();
        SPECIAL_EVENT_CUES.iter().any(|cue| source.contains(cue))
    }
}

/// Ordered, typed field list handed to the completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl EventSchema {
    /// Strict JSON Schema for a single record, properties in declared order.
    pub fn record_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in self.fields {
            properties.insert(
                field.name.to_string(),
                json!({
                    "type": field.kind.json_type(),
                    "description": field.description,
                }),
            );
        }
        let required: Vec<&str> = self.fields.iter().map(|field| field.name).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Structured-output schemas need an object at the top level, so records
    /// are wrapped in an `events` array.
    pub fn envelope_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "events": {
                    "type": "array",
                    "items": self.record_schema(),
                }
            },
            "required": ["events"],
            "additionalProperties": false,
        })
    }
}
