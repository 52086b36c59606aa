/// Pipeline phase a progress message refers to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressPhase {
    Scanning,
    Parsing,
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
    /// A file was skipped
    Error(String),
}
