use std::fmt;

/// Stages of a single question, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ValidateQuestion,
    TableCheck,
    Introspect,
    GenerateSql,
    ValidateSql,
    Execute,
    ValidateResult,
    GenerateExplanation,
    ValidateExplanation,
    Emit,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::ValidateQuestion => "ValidateQuestion",
            Self::TableCheck => "TableCheck",
            Self::Introspect => "Introspect",
            Self::GenerateSql => "GenerateSql",
            Self::ValidateSql => "ValidateSql",
            Self::Execute => "Execute",
            Self::ValidateResult => "ValidateResult",
            Self::GenerateExplanation => "GenerateExplanation",
            Self::ValidateExplanation => "ValidateExplanation",
            Self::Emit => "Emit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
