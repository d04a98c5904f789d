//! Closed string enumerations of the IR.
//!
//! Each enumeration serializes as its lowercase wire name and parses from
//! exactly that name; anything else is rejected with [`ParseEnumError`].

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string that is not a member of a closed enumeration.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("invalid {field} '{value}', must be one of: {}", allowed.join(", "))]
#[diagnostic(code(sykli::ir::invalid_enum_value))]
pub struct ParseEnumError {
    /// Name of the field being parsed (e.g. `criticality`).
    pub field: &'static str,
    /// The rejected input.
    pub value: String,
    /// The accepted wire names.
    pub allowed: &'static [&'static str],
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every accepted wire name, in declaration order.
            pub const ALLOWED: &'static [&'static str] = &[$($wire),+];

            /// The wire name of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok(Self::$variant), )+
                    _ => Err(ParseEnumError {
                        field: $field,
                        value: s.to_string(),
                        allowed: Self::ALLOWED,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// How important a task is to the health of the pipeline.
    Criticality, "criticality" {
        /// Failure blocks everything downstream.
        High => "high",
        /// Default importance.
        Medium => "medium",
        /// Nice to have.
        Low => "low",
    }
}

closed_enum! {
    /// What the engine's assistant does when a task fails.
    OnFailAction, "on_fail" {
        /// Analyze the failure output.
        Analyze => "analyze",
        /// Retry the task.
        Retry => "retry",
        /// Skip and continue.
        Skip => "skip",
    }
}

closed_enum! {
    /// How the engine decides whether to run a task.
    SelectMode, "select_mode" {
        /// Run only when affected by the change set.
        Smart => "smart",
        /// Always run.
        Always => "always",
        /// Run only on explicit request.
        Manual => "manual",
    }
}

closed_enum! {
    /// How a gate waits for approval.
    GateStrategy, "gate_strategy" {
        /// Interactive prompt.
        Prompt => "prompt",
        /// Environment variable set to a truthy value.
        Env => "env",
        /// Presence of a file.
        File => "file",
        /// External webhook callback.
        Webhook => "webhook",
    }
}

closed_enum! {
    /// Where a typed secret reference is resolved from.
    SecretSource, "secret_source" {
        /// Environment variable.
        Env => "env",
        /// File on disk.
        File => "file",
        /// Vault path.
        Vault => "vault",
    }
}

closed_enum! {
    /// Kind of resource behind a mount.
    MountType, "mount_type" {
        /// Source directory.
        Directory => "directory",
        /// Named cache volume.
        Cache => "cache",
    }
}
