//! Typed LiveSplit Server command vocabulary.
//!
//! A thin mapping from [`Command`] variants to wire text. Control verbs are
//! fire-and-forget; queries expect exactly one reply line. Arguments are
//! passed through untouched; the server is the authority on their format
//! (for example `1:23.45` for times).

use std::fmt::{Display, Formatter};

/// Timing method selectable with [`Command::SwitchTo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingMethod {
    /// Wall-clock time.
    RealTime,
    /// Game time, usually load-removed.
    GameTime,
}

impl TimingMethod {
    fn wire(self) -> &'static str {
        match self {
            Self::RealTime => "realtime",
            Self::GameTime => "gametime",
        }
    }
}

/// A protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Timer control.
    /// Start the timer.
    StartTimer,
    /// Start the timer, or split if it is running.
    StartOrSplit,
    /// Split.
    Split,
    /// Undo the last split.
    Unsplit,
    /// Skip the current split.
    SkipSplit,
    /// Pause the timer.
    Pause,
    /// Resume a paused timer.
    Resume,
    /// Reset the timer.
    Reset,

    // Game time.
    /// Initialise game time.
    InitGameTime,
    /// Set game time.
    SetGameTime(String),
    /// Set loading times.
    SetLoadingTimes(String),
    /// Pause game time.
    PauseGameTime,
    /// Unpause game time.
    UnpauseGameTime,

    // Comparison and timing method.
    /// Switch the current comparison.
    SetComparison(String),
    /// Switch the timing method.
    SwitchTo(TimingMethod),

    // Queries.
    /// Delta against a comparison (the current one when `None`).
    GetDelta(Option<String>),
    /// Time of the last split.
    GetLastSplitTime,
    /// Comparison time of the current split.
    GetComparisonSplitTime,
    /// Current timer value.
    GetCurrentTime,
    /// Final time against a comparison (the current one when `None`).
    GetFinalTime(Option<String>),
    /// Predicted final time against a comparison.
    GetPredictedTime(String),
    /// Best possible final time.
    GetBestPossibleTime,
    /// Index of the current split.
    GetSplitIndex,
    /// Name of the current split.
    GetCurrentSplitName,
    /// Name of the previous split.
    GetPreviousSplitName,
    /// Timer phase (`NotRunning`, `Running`, `Ended`, `Paused`).
    GetCurrentTimerPhase,
    /// Liveness check; the server answers `pong`.
    Ping,
}

impl Command {
    /// Wire text, without terminator.
    #[must_use]
    pub fn wire(&self) -> String {
        match self {
            Self::SetGameTime(arg) => with_arg("setgametime", arg),
            Self::SetLoadingTimes(arg) => with_arg("setloadingtimes", arg),
            Self::SetComparison(arg) => with_arg("setcomparison", arg),
            Self::SwitchTo(method) => with_arg("switchto", method.wire()),
            Self::GetDelta(Some(arg)) => with_arg("getdelta", arg),
            Self::GetFinalTime(Some(arg)) => with_arg("getfinaltime", arg),
            Self::GetPredictedTime(arg) => with_arg("getpredictedtime", arg),
            other => other.verb().to_owned(),
        }
    }

    /// The bare command token.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::StartTimer => "starttimer",
            Self::StartOrSplit => "startorsplit",
            Self::Split => "split",
            Self::Unsplit => "unsplit",
            Self::SkipSplit => "skipsplit",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Reset => "reset",
            Self::InitGameTime => "initgametime",
            Self::SetGameTime(_) => "setgametime",
            Self::SetLoadingTimes(_) => "setloadingtimes",
            Self::PauseGameTime => "pausegametime",
            Self::UnpauseGameTime => "unpausegametime",
            Self::SetComparison(_) => "setcomparison",
            Self::SwitchTo(_) => "switchto",
            Self::GetDelta(_) => "getdelta",
            Self::GetLastSplitTime => "getlastsplittime",
            Self::GetComparisonSplitTime => "getcomparisonsplittime",
            Self::GetCurrentTime => "getcurrenttime",
            Self::GetFinalTime(_) => "getfinaltime",
            Self::GetPredictedTime(_) => "getpredictedtime",
            Self::GetBestPossibleTime => "getbestpossibletime",
            Self::GetSplitIndex => "getsplitindex",
            Self::GetCurrentSplitName => "getcurrentsplitname",
            Self::GetPreviousSplitName => "getprevioussplitname",
            Self::GetCurrentTimerPhase => "getcurrenttimerphase",
            Self::Ping => "ping",
        }
    }

    /// Whether the server answers this command with a line.
    #[must_use]
    pub fn expects_response(&self) -> bool {
        matches!(
            self,
            Self::GetDelta(_)
                | Self::GetLastSplitTime
                | Self::GetComparisonSplitTime
                | Self::GetCurrentTime
                | Self::GetFinalTime(_)
                | Self::GetPredictedTime(_)
                | Self::GetBestPossibleTime
                | Self::GetSplitIndex
                | Self::GetCurrentSplitName
                | Self::GetPreviousSplitName
                | Self::GetCurrentTimerPhase
                | Self::Ping
        )
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.wire())
    }
}

fn with_arg(verb: &str, arg: &str) -> String {
    format!("{verb} {arg}")
}
