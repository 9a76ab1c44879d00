use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use stride_probe::Probe;
use stride_tracer::TraceConfig;
use stride_tracer::binding::{Frame, Value};
use stride_tracer::event::{EventFilter, EventKind, Receiver};
use stride_tracer::tracer::{TraceState, Tracer};
use test_log::test;

use crate::common::{Program, tracer};

#[test]
fn silent_run_finishes_without_events() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    tracer.pause_when(|_| false);

    assert!(!tracer.is_started());
    assert!(tracer.start().unwrap().is_none());
    assert_eq!(tracer.state(), TraceState::Finished);
    assert!(tracer.is_finished());
}

#[test]
fn single_call_pauses_twice() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.echo(1, "hello");
    });

    tracer.set_events([EventKind::Call, EventKind::Return].into_iter().collect());

    let call = tracer.start().unwrap().expect("call");
    assert_eq!(call.kind(), EventKind::Call);
    assert_eq!(call.signature().as_deref(), Some("Planet#echo"));
    assert!(tracer.is_sleeping());

    let ret = tracer.resume().unwrap().expect("return");
    assert_eq!(ret.kind(), EventKind::Return);
    assert_eq!(ret.method(), Some("echo"));
    assert!(ret.created_at() >= call.created_at());

    assert!(tracer.resume().unwrap().is_none());
    assert!(tracer.is_finished());
}

#[test]
fn paused_mutation_is_visible_to_traced_code() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    let call = tracer.start().unwrap().expect("call");
    assert!(call.is_host_call());
    assert_eq!(call.signature().as_deref(), Some("Math.add"));
    assert_eq!(call.binding().get("x"), Some(Value::Int(2)));

    assert!(call.binding().set("x", 4));

    let to_s = tracer.resume().unwrap().expect("native call");
    assert!(to_s.is_native_call());
    assert_eq!(to_s.signature().as_deref(), Some("Integer#to_s"));
    assert_eq!(to_s.receiver().to_string(), "#<Integer:0x9>");

    let to_s = tracer.resume().unwrap().expect("native return");
    assert!(to_s.is_native_return());

    let ret = tracer.resume().unwrap().expect("return");
    assert!(ret.is_host_return());
    assert_eq!(ret.binding().get("sum"), Some(Value::Int(9)));
    assert_eq!(ret.binding().get("text"), Some(Value::from("9")));

    assert!(tracer.resume().unwrap().is_none());
}

#[test]
fn resume_starts_the_trace() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    assert_eq!(tracer.state(), TraceState::NotStarted);

    let call = tracer.resume().unwrap().expect("call");
    assert_eq!(call.kind(), EventKind::Call);
    assert!(tracer.is_started());
    assert!(tracer.is_sleeping());
}

#[test]
fn resume_after_completion_returns_nothing() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    assert_eq!(tracer.collect().unwrap().len(), 4);

    assert!(tracer.resume().unwrap().is_none());
    assert!(tracer.resume().unwrap().is_none());
    assert!(tracer.is_finished());
}

#[test]
fn collect_matches_manual_resumes() {
    let program = Program::new();

    let body = |program: &Program| {
        program.add(2, 5);
        program.echo(7, "ping");
        program.add(1, 1);
    };

    let mut manual = tracer(&program, body);
    let mut stepped = Vec::new();
    while let Some(event) = manual.resume().unwrap() {
        stepped.push(event);
    }

    let pauses = Arc::new(AtomicUsize::new(0));
    let mut collecting = tracer(&program, body);
    collecting.pause_when({
        let pauses = Arc::clone(&pauses);
        move |event| {
            let pause = event.is_call() || event.is_return();
            if pause {
                pauses.fetch_add(1, Ordering::Relaxed);
            }
            pause
        }
    });

    let collected = collecting.collect().unwrap();

    assert_eq!(collected.len(), pauses.load(Ordering::Relaxed));
    assert_eq!(collected.len(), stepped.len());

    for (collected, stepped) in collected.iter().zip(&stepped) {
        assert_eq!(collected.kind(), stepped.kind());
        assert_eq!(collected.location(), stepped.location());
        assert_eq!(collected.signature(), stepped.signature());
    }
}

#[test]
fn collect_without_pauses_is_empty() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    tracer.pause_when(|_| false);

    assert!(tracer.collect().unwrap().is_empty());
}

#[test]
fn sequence_is_lazy() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    let first = tracer.sequence().next().expect("first").unwrap();
    assert_eq!(first.kind(), EventKind::Call);
    assert!(tracer.is_sleeping());

    let rest = tracer.sequence().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(rest.len(), 3);
    assert!(tracer.is_finished());
}

#[test]
fn line_events_carry_source_line() {
    let probe = Probe::new();
    let traced = probe.clone();

    let mut tracer = Tracer::builder()
        .with_source(probe)
        .with_target(move || {
            let frame = Frame::new().with("line", i64::from(line!()) + 1);
            traced.line(&Receiver::None, &frame);
        })
        .events(EventFilter::All)
        .pause_when(|event| event.kind() == EventKind::Line)
        .build();

    let line = tracer.start().unwrap().expect("line");

    assert_eq!(line.kind(), EventKind::Line);
    assert_eq!(line.path(), file!());
    assert_eq!(
        line.binding().get("line").and_then(|line| line.as_int()),
        Some(i64::from(line.line()))
    );
    assert_eq!(line.receiver().to_string(), "main");
    assert!(line.signature().is_none());
}

#[test]
fn predicate_replacement_applies_to_paused_trace() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    assert!(tracer.start().unwrap().is_some());

    tracer.pause_when(|event| event.is_host_return());

    let ret = tracer.resume().unwrap().expect("return");
    assert_eq!(ret.kind(), EventKind::Return);
    assert!(tracer.resume().unwrap().is_none());
}

#[test]
fn start_while_paused_is_rejected() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    let call = tracer.start().unwrap().expect("call");

    assert!(matches!(tracer.start(), Err(stride_tracer::Error::InProgress)));
    assert!(tracer.is_sleeping());

    // the in-flight trace is untouched
    let next = tracer.resume().unwrap().expect("native call");
    assert_eq!(next.kind(), EventKind::NativeCall);
    assert!(call.binding().is_live());
}

#[test]
fn stop_while_paused_runs_no_more_traced_code() {
    let reached = Arc::new(AtomicBool::new(false));

    let program = Program::new();
    let mut tracer = tracer(&program, {
        let reached = Arc::clone(&reached);
        move |program| {
            program.add(2, 5);
            reached.store(true, Ordering::SeqCst);
        }
    });

    let call = tracer.start().unwrap().expect("call");

    tracer.stop();

    assert!(tracer.is_finished());
    assert!(!reached.load(Ordering::SeqCst));
    assert!(!call.binding().is_live());

    // idempotent
    tracer.stop();
    assert!(tracer.is_finished());
    assert!(tracer.resume().unwrap().is_none());
}

#[test]
fn stop_unwinds_again_when_caught() {
    let reached = Arc::new(AtomicBool::new(false));

    let program = Program::new();
    let mut tracer = tracer(&program, {
        let reached = Arc::clone(&reached);
        move |program| {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| program.add(2, 5)));
            program.echo(1, "after");
            reached.store(true, Ordering::SeqCst);
        }
    });

    assert!(tracer.start().unwrap().is_some());

    tracer.stop();

    assert!(tracer.is_finished());
    assert!(!reached.load(Ordering::SeqCst));
    assert!(!program.probe.is_observed());
}

#[test]
fn stop_before_start_is_a_noop() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    tracer.stop();

    assert_eq!(tracer.state(), TraceState::NotStarted);
}

#[test]
fn trace_restarts_after_stop() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    let first = tracer.start().unwrap().expect("call");
    tracer.stop();

    let second = tracer.start().unwrap().expect("call");
    assert_eq!(second.location(), first.location());
    assert!(tracer.is_sleeping());

    assert_eq!(tracer.collect().unwrap().len(), 3);
}

#[test]
fn trace_restarts_after_completion() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.echo(3, "again");
    });

    assert_eq!(tracer.collect().unwrap().len(), 2);

    assert!(tracer.start().unwrap().is_some());
    assert!(tracer.resume().unwrap().is_some());
    assert!(tracer.resume().unwrap().is_none());
}

#[test]
fn binding_detaches_after_completion() {
    let program = Program::new();
    let mut tracer = tracer(&program, |program| {
        program.add(2, 5);
    });

    let call = tracer.start().unwrap().expect("call");
    assert!(call.binding().is_live());

    while tracer.resume().unwrap().is_some() {}

    assert!(!call.binding().is_live());
    assert!(call.binding().get("x").is_none());
    assert!(!call.binding().set("x", 1));
}

#[test]
fn dropping_a_paused_tracer_terminates_it() {
    let reached = Arc::new(AtomicBool::new(false));

    let program = Program::new();
    let mut tracer = tracer(&program, {
        let reached = Arc::clone(&reached);
        move |program| {
            program.add(2, 5);
            reached.store(true, Ordering::SeqCst);
        }
    });

    assert!(tracer.start().unwrap().is_some());
    drop(tracer);

    assert!(!reached.load(Ordering::SeqCst));
    assert!(!program.probe.is_observed());
}

#[test]
fn tracer_from_config() {
    let config = TraceConfig::parse(
        "<content>",
        indoc::indoc! {r#"
            events "*"
            pause-on "line" "return"
        "#},
    )
    .map_err(miette::Report::new)
    .expect("parse kdl");

    let program = Program::new();
    let traced = Arc::clone(&program);

    let mut tracer = Tracer::builder()
        .with_source(program.probe.clone())
        .with_target(move || {
            traced.echo(1, "hi");
        })
        .with_config(&config)
        .unwrap()
        .build();

    assert_eq!(tracer.events(), &EventFilter::All);

    let kinds = tracer
        .collect()
        .unwrap()
        .into_iter()
        .map(|event| event.kind())
        .collect::<Vec<_>>();

    assert_eq!(kinds, [EventKind::Line, EventKind::Return]);
}

#[test]
fn config_with_unknown_kinds_is_rejected() {
    let config = TraceConfig::parse("<content>", r#"pause-on "jump""#)
        .map_err(miette::Report::new)
        .expect("parse kdl");

    let program = Program::new();

    let builder = Tracer::builder()
        .with_source(program.probe.clone())
        .with_target(|| ())
        .with_config(&config);

    assert!(matches!(
        builder,
        Err(stride_tracer::Error::InvalidArgument(_))
    ));
}
