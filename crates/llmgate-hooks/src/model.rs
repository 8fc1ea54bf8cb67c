/// Which side of the upstream call a hook inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Input,
    Output,
}

impl HookStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookStage::Input => "input",
            HookStage::Output => "output",
        }
    }
}

/// Whether a hook asserts (guardrail) or rewrites (mutator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Guardrail,
    Mutator,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Guardrail => "guardrail",
            HookKind::Mutator => "mutator",
        }
    }
}
