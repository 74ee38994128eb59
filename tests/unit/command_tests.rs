//! Unit tests for the typed command vocabulary.

use splitlink::commands::TimingMethod;
use splitlink::Command;

#[test]
fn bare_commands_use_their_verb() {
    assert_eq!(Command::StartOrSplit.wire(), "startorsplit");
    assert_eq!(Command::GetCurrentTimerPhase.wire(), "getcurrenttimerphase");
    assert_eq!(Command::Ping.to_string(), "ping");
}

#[test]
fn arguments_follow_a_single_space() {
    assert_eq!(
        Command::SetGameTime("1:23.45".into()).wire(),
        "setgametime 1:23.45"
    );
    assert_eq!(
        Command::SetComparison("Personal Best".into()).wire(),
        "setcomparison Personal Best"
    );
    assert_eq!(
        Command::SwitchTo(TimingMethod::GameTime).wire(),
        "switchto gametime"
    );
    assert_eq!(
        Command::SwitchTo(TimingMethod::RealTime).wire(),
        "switchto realtime"
    );
}

#[test]
fn optional_comparison_is_omitted_when_absent() {
    assert_eq!(Command::GetDelta(None).wire(), "getdelta");
    assert_eq!(
        Command::GetDelta(Some("Best Segments".into())).wire(),
        "getdelta Best Segments"
    );
    assert_eq!(Command::GetFinalTime(None).wire(), "getfinaltime");
}

#[test]
fn control_verbs_are_fire_and_forget() {
    for command in [
        Command::StartTimer,
        Command::Split,
        Command::Unsplit,
        Command::SkipSplit,
        Command::Pause,
        Command::Resume,
        Command::Reset,
        Command::InitGameTime,
        Command::PauseGameTime,
        Command::UnpauseGameTime,
        Command::SetLoadingTimes("0.50".into()),
    ] {
        assert!(!command.expects_response(), "{command} expects no reply");
    }
}

#[test]
fn queries_expect_a_reply() {
    for command in [
        Command::GetCurrentTime,
        Command::GetSplitIndex,
        Command::GetLastSplitTime,
        Command::GetComparisonSplitTime,
        Command::GetBestPossibleTime,
        Command::GetCurrentSplitName,
        Command::GetPreviousSplitName,
        Command::GetPredictedTime("Personal Best".into()),
        Command::Ping,
    ] {
        assert!(command.expects_response(), "{command} expects a reply");
    }
}

#[test]
fn verb_ignores_arguments() {
    assert_eq!(Command::GetPredictedTime("x".into()).verb(), "getpredictedtime");
    assert_eq!(Command::SetGameTime("x".into()).verb(), "setgametime");
}
