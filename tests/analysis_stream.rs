use repoai_session::{
    parse_frame, AnalysisController, AnalysisSession, AnalysisState, FileResult, Frame,
    FrameParse, Progress, SessionError, StreamDecoder, Transition,
};

const FRAMES: &[&str] = &[
    r#"{"type":"status","message":"🔍 Scanning octo/demo (main)..."}"#,
    r#"{"type":"progress","current":1,"total":2,"file":"src/café.py"}"#,
    r#"{"type":"file_result","file":"src/café.py","analysis":"**Purpose** — naïve parser"}"#,
    r#"{"type":"progress","current":2,"total":2,"file":"README.md"}"#,
    r#"{"type":"file_result","file":"README.md","analysis":"docs ✅"}"#,
    r#"{"type":"done","total_analyzed":2}"#,
];

fn wire_body(frames: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for frame in frames {
        body.push_str("data: ");
        body.push_str(frame);
        body.push_str("\n\n");
    }
    body.into_bytes()
}

fn expected_lines(frames: &[&str]) -> Vec<String> {
    frames.iter().map(|frame| format!("data: {frame}")).collect()
}

fn decode_chunks(chunks: &[&[u8]]) -> Vec<String> {
    let mut decoder = StreamDecoder::default();
    let mut lines = Vec::new();
    for chunk in chunks {
        lines.extend(decoder.feed(chunk));
    }
    decoder.finish();
    lines
}

fn frame(line: &str) -> Frame {
    match parse_frame(&format!("data: {line}")) {
        FrameParse::Frame(frame) => frame,
        FrameParse::Dropped(reason) => panic!("expected a frame, dropped: {reason:?}"),
    }
}

fn running_session() -> AnalysisSession {
    let mut session = AnalysisSession::new();
    session.start();
    session
}

#[test]
fn every_two_point_split_yields_the_same_frames() {
    let body = wire_body(FRAMES);
    let expected = expected_lines(FRAMES);

    for first in 0..=body.len() {
        for second in first..=body.len() {
            let lines = decode_chunks(&[&body[..first], &body[first..second], &body[second..]]);
            assert_eq!(lines, expected, "split at {first}/{second}");
        }
    }
}

#[test]
fn byte_at_a_time_delivery_yields_the_same_frames() {
    let body = wire_body(FRAMES);
    let chunks: Vec<&[u8]> = body.chunks(1).collect();

    assert_eq!(decode_chunks(&chunks), expected_lines(FRAMES));
}

#[test]
fn decoded_frames_parse_back_to_typed_events() {
    let lines = StreamDecoder::decode_all(&wire_body(FRAMES));
    let parsed: Vec<FrameParse> = lines.iter().map(|line| parse_frame(line)).collect();

    assert_eq!(parsed.len(), FRAMES.len());
    assert_eq!(
        parsed[2],
        FrameParse::Frame(Frame::FileResult {
            file: "src/café.py".to_string(),
            analysis: "**Purpose** — naïve parser".to_string(),
        })
    );
}

#[test]
fn progress_results_and_summary_complete_in_order() {
    let mut session = running_session();
    for line in [
        r#"{"type":"progress","current":1,"total":3,"file":"a.py"}"#,
        r#"{"type":"file_result","file":"a.py","analysis":"x"}"#,
        r#"{"type":"progress","current":2,"total":3,"file":"b.py"}"#,
        r#"{"type":"file_result","file":"b.py","analysis":"y"}"#,
        r#"{"type":"summary","summary":"ok"}"#,
    ] {
        assert_eq!(session.apply(&frame(line)), Transition::Applied);
    }

    assert_eq!(session.state(), AnalysisState::Completed);
    assert_eq!(
        session.results(),
        &[
            FileResult {
                path: "a.py".to_string(),
                analysis: "x".to_string(),
            },
            FileResult {
                path: "b.py".to_string(),
                analysis: "y".to_string(),
            },
        ]
    );
    assert_eq!(
        session.progress(),
        &Progress {
            current: 2,
            total: 3,
            current_item: "b.py".to_string(),
        }
    );
    assert_eq!(session.summary(), Some("ok"));
}

#[test]
fn done_after_summary_is_a_no_op() {
    let mut session = running_session();
    session.apply(&Frame::Summary {
        summary: "ok".to_string(),
    });
    let before = session.clone();

    assert_eq!(
        session.apply(&Frame::Done { total_analyzed: 2 }),
        Transition::Ignored
    );
    assert_eq!(session, before);
    assert_eq!(session.summary(), Some("ok"));
}

#[test]
fn done_without_summary_synthesizes_a_completion_notice() {
    let mut session = running_session();
    session.apply(&Frame::Done { total_analyzed: 4 });

    assert_eq!(session.state(), AnalysisState::Completed);
    assert_eq!(session.summary(), Some("Analysis complete: 4 file(s) analyzed."));
}

#[test]
fn error_frame_fails_and_freezes_the_session() {
    let mut session = running_session();
    session.apply(&Frame::Error {
        message: "No matching files found.".to_string(),
    });
    let frozen = session.clone();

    assert_eq!(
        session.apply(&Frame::FileResult {
            file: "late.py".to_string(),
            analysis: "late".to_string(),
        }),
        Transition::Ignored
    );
    assert_eq!(
        session.apply(&Frame::Summary {
            summary: "late".to_string(),
        }),
        Transition::Ignored
    );
    assert_eq!(session, frozen);
    assert_eq!(session.state(), AnalysisState::Failed);
    assert_eq!(session.error_message(), Some("No matching files found."));
}

#[test]
fn duplicate_paths_are_both_retained() {
    let mut session = running_session();
    for analysis in ["first", "second"] {
        session.apply(&Frame::FileResult {
            file: "a.py".to_string(),
            analysis: analysis.to_string(),
        });
    }

    let analyses: Vec<&str> = session
        .results()
        .iter()
        .map(|result| result.analysis.as_str())
        .collect();
    assert_eq!(analyses, vec!["first", "second"]);
}

#[test]
fn malformed_frame_leaves_state_unchanged_and_next_frame_applies() {
    let mut controller = AnalysisController::new();
    let id = controller.start();
    controller.feed(
        id,
        b"data: {\"type\":\"progress\",\"current\":1,\"total\":2,\"file\":\"a.py\"}\n\n",
    );
    let before = controller.session().clone();

    let stats = controller.feed(id, b"data: {\"type\":\"file_result\",\"file\":\n\n");
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.dispatched, 0);
    assert_eq!(controller.session(), &before);

    let stats = controller.feed(
        id,
        b"data: {\"type\":\"file_result\",\"file\":\"a.py\",\"analysis\":\"fine\"}\n\n",
    );
    assert_eq!(stats.dispatched, 1);
    assert_eq!(controller.session().results().len(), 1);
}

#[test]
fn unknown_frame_types_are_ignored() {
    let mut controller = AnalysisController::new();
    let id = controller.start();
    let stats = controller.feed(id, b"data: {\"type\":\"heartbeat\",\"at\":1}\n\n");

    assert_eq!(stats.dropped, 1);
    assert_eq!(controller.session().state(), AnalysisState::Running);
    assert!(controller.session().results().is_empty());
}

#[test]
fn restarting_resets_state_and_ignores_the_old_stream() {
    let mut controller = AnalysisController::new();
    let first = controller.start();
    controller.feed(
        first,
        b"data: {\"type\":\"file_result\",\"file\":\"old.py\",\"analysis\":\"old\"}\n\n",
    );

    let second = controller.start();
    assert_ne!(first, second);
    assert!(controller.session().results().is_empty());

    let stats = controller.feed(
        first,
        b"data: {\"type\":\"summary\",\"summary\":\"stale\"}\n\n",
    );
    assert_eq!(stats.dispatched, 0);
    assert_eq!(
        controller.apply_frame(first, &Frame::Error {
            message: "stale".to_string(),
        }),
        Transition::Ignored
    );
    assert_eq!(controller.session().state(), AnalysisState::Running);
    assert_eq!(controller.current_id(), Some(second));
}

#[test]
fn unterminated_final_fragment_is_dropped_at_stream_end() {
    let mut controller = AnalysisController::new();
    let id = controller.start();
    controller.feed(id, b"data: {\"type\":\"summary\",\"summary\":\"never\"}");
    controller.finish(id);

    assert_eq!(controller.session().state(), AnalysisState::Running);
    assert_eq!(controller.session().summary(), None);
}

#[test]
fn transport_failure_is_reported_once_and_keeps_session_running() {
    let mut controller = AnalysisController::new();
    let id = controller.start();

    assert_eq!(
        controller.fail_transport(id, "connection reset"),
        Some(SessionError::Transport("connection reset".to_string()))
    );
    assert_eq!(controller.fail_transport(id, "connection reset"), None);
    assert_eq!(controller.transport_error(), Some("connection reset"));
    assert_eq!(controller.session().state(), AnalysisState::Running);

    let retry = controller.start();
    assert_eq!(controller.transport_error(), None);
    assert_eq!(controller.fail_transport(id, "late"), None);
    assert!(controller.fail_transport(retry, "again").is_some());
}
