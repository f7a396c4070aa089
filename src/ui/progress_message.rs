#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressPhase {
    Translating,
    Linking,
}

#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Started {
        phase: ProgressPhase,
        total: usize,
    },
    Progress {
        phase: ProgressPhase,
        current: usize,
        file: Option<String>,
    },
    Finished {
        phase: ProgressPhase,
    },
    /// A unit was aborted
    Error(String),
}
