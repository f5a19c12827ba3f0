// minnow-embed integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Tests for the minnow-embed embedding API.

use minnow_embed::{DiagnosticKind, Engine, Error, RuntimeError, Value};

// =============================================================================
// Compiling and running
// =============================================================================

mod compile_and_run {
    use super::*;

    #[test]
    fn globals_read_back_typed() {
        let mut engine = Engine::new();
        engine.compile("t", "x := 6 * 7 flag := true").unwrap();
        let thread = engine.run().unwrap();

        let x: f64 = engine.global(&thread, "x").unwrap();
        assert_eq!(x, 42.0);
        let x: i32 = engine.global(&thread, "x").unwrap();
        assert_eq!(x, 42);
        let flag: bool = engine.global(&thread, "flag").unwrap();
        assert!(flag);
    }

    #[test]
    fn string_globals_read_back() {
        let mut engine = Engine::new();
        engine.compile("t", "s := \"hello\"").unwrap();
        let thread = engine.run().unwrap();
        let s: String = engine.global(&thread, "s").unwrap();
        assert_eq!(s, "hello");
    }

    #[test]
    fn recompiling_concatenates() {
        let mut engine = Engine::new();
        engine.compile("first", "x := 1").unwrap();
        engine.compile("second", "y := x + 1").unwrap();
        let thread = engine.run().unwrap();
        let y: f64 = engine.global(&thread, "y").unwrap();
        assert_eq!(y, 2.0);
    }

    #[test]
    fn compile_file_runs_from_disk(){
        let path = std::env::temp_dir().join("minnow_embed_test.mnw");
        std::fs::write(&path, "answer := 42").unwrap();

        let mut engine = Engine::new();
        engine.compile_file(&path).unwrap();
        let thread = engine.run().unwrap();
        let answer: f64 = engine.global(&thread, "answer").unwrap();
        assert_eq!(answer, 42.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_a_compile_error() {
        let mut engine = Engine::new();
        let err = engine.compile_file("/nonexistent/nope.mnw").unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
    }
}

// =============================================================================
// Binding host functions and constants
// =============================================================================

mod bindings {
    use super::*;

    #[test]
    fn bound_function_is_callable_from_script() {
        let mut engine = Engine::new();
        engine
            .bind_function("add", |_thread, args| {
                let a = args[0].as_number().unwrap_or(0.0);
                let b = args[1].as_number().unwrap_or(0.0);
                Ok(Value::number(a + b))
            })
            .unwrap();
        engine.compile("t", "z := add(2, 40)").unwrap();
        let thread = engine.run().unwrap();
        let z: f64 = engine.global(&thread, "z").unwrap();
        assert_eq!(z, 42.0);
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let mut engine = Engine::new();
        engine
            .bind_function("dup", |_t, _a| Ok(Value::Null))
            .unwrap();
        let err = engine
            .bind_function("dup", |_t, _a| Ok(Value::Null))
            .unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
    }

    #[test]
    fn bound_constants_are_visible() {
        let mut engine = Engine::new();
        engine.bind_const_number("MAX_LIVES", 3.0).unwrap();
        engine.bind_const_string("TITLE", "minnow").unwrap();
        engine
            .compile("t", "lives := MAX_LIVES same := (TITLE == \"minnow\")")
            .unwrap();
        let thread = engine.run().unwrap();
        let lives: f64 = engine.global(&thread, "lives").unwrap();
        assert_eq!(lives, 3.0);
        let same: bool = engine.global(&thread, "same").unwrap();
        assert!(same);
    }

    #[test]
    fn host_strings_cross_as_owned_values() {
        let mut engine = Engine::new();
        engine
            .bind_function("greet", |thread, args| {
                let name = thread
                    .value_str(&args[0])
                    .unwrap_or("world")
                    .to_string();
                Ok(thread.new_string(format!("hello, {}", name)))
            })
            .unwrap();
        engine.compile("t", "g := greet(\"fish\")").unwrap();
        let thread = engine.run().unwrap();
        let g: String = engine.global(&thread, "g").unwrap();
        assert_eq!(g, "hello, fish");
    }
}

// =============================================================================
// Calling script functions from the host
// =============================================================================

mod calls {
    use super::*;

    #[test]
    fn call_by_name() {
        let mut engine = Engine::new();
        engine
            .compile("t", "func area(w, h) { return w * h } unused := area(1, 1)")
            .unwrap();
        let mut thread = engine.run().unwrap();
        let result = engine
            .call(
                &mut thread,
                "area",
                &[Value::number(6.0), Value::number(7.0)],
            )
            .unwrap();
        assert_eq!(result.as_number(), Some(42.0));
    }

    #[test]
    fn call_unknown_function() {
        let mut engine = Engine::new();
        engine.compile("t", "x := 0").unwrap();
        let mut thread = engine.run().unwrap();
        let err = engine.call(&mut thread, "nope", &[]).unwrap_err();
        assert!(matches!(err, Error::UndefinedFunction(name) if name == "nope"));
    }

    #[test]
    fn set_global_round_trips() {
        let mut engine = Engine::new();
        engine.compile("t", "x := 1").unwrap();
        let mut thread = engine.run().unwrap();
        engine.set_global(&mut thread, "x", 99.5).unwrap();
        let x: f64 = engine.global(&thread, "x").unwrap();
        assert_eq!(x, 99.5);

        engine.set_global(&mut thread, "x", "now a string").unwrap();
        let x: String = engine.global(&thread, "x").unwrap();
        assert_eq!(x, "now a string");
    }
}

// =============================================================================
// Errors and conversions
// =============================================================================

mod errors {
    use super::*;

    #[test]
    fn compile_errors_carry_kind_and_position() {
        let mut engine = Engine::new();
        let err = engine.compile("bad.mnw", "x := 1\nx := 2").unwrap_err();
        let Error::Compile(diagnostic) = err else {
            panic!("expected a compile error");
        };
        assert_eq!(diagnostic.kind, DiagnosticKind::Semantic);
        assert_eq!(diagnostic.pos.line, 2);
        assert_eq!(&*diagnostic.pos.file, "bad.mnw");
    }

    #[test]
    fn runtime_errors_surface() {
        let mut engine = Engine::new();
        engine.compile("t", "x := 1 and 2").unwrap();
        let err = engine.run().unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime(RuntimeError::TypeError { expected: "bool", .. })
        ));
    }

    #[test]
    fn unknown_global_is_reported() {
        let mut engine = Engine::new();
        engine.compile("t", "x := 1").unwrap();
        let thread = engine.run().unwrap();
        let err = engine.global::<f64>(&thread, "nope").unwrap_err();
        assert!(matches!(err, Error::UndefinedGlobal(name) if name == "nope"));
    }

    #[test]
    fn conversion_failures_are_typed() {
        let mut engine = Engine::new();
        engine.compile("t", "x := 1.5 s := \"text\"").unwrap();
        let thread = engine.run().unwrap();

        let err = engine.global::<bool>(&thread, "x").unwrap_err();
        assert!(matches!(err, Error::Conversion { expected: "bool", .. }));

        let err = engine.global::<i64>(&thread, "x").unwrap_err();
        assert!(matches!(err, Error::Conversion { .. }));

        let err = engine.global::<f64>(&thread, "s").unwrap_err();
        assert!(matches!(err, Error::Conversion { expected: "f64", .. }));
    }

    #[test]
    fn null_converts_to_none() {
        let mut engine = Engine::new();
        engine.compile("t", "x := null y := 3").unwrap();
        let thread = engine.run().unwrap();
        let x: Option<f64> = engine.global(&thread, "x").unwrap();
        assert_eq!(x, None);
        let y: Option<f64> = engine.global(&thread, "y").unwrap();
        assert_eq!(y, Some(3.0));
    }

    #[test]
    fn warnings_accumulate() {
        let mut engine = Engine::new();
        engine
            .compile("t", "func f() { k :: 1 return k } x := f()")
            .unwrap();
        assert_eq!(engine.warnings().len(), 1);
        assert!(engine.warnings()[0].message.contains("global scope"));
    }

    #[test]
    fn rendered_diagnostics_window_the_source() {
        let source = "a := 1\nb := unknown\nc := 3";
        let mut engine = Engine::new();
        let err = engine.compile("win.mnw", source).unwrap_err();
        let Error::Compile(diagnostic) = err else {
            panic!("expected a compile error");
        };
        let rendered = diagnostic.render(source);
        assert!(rendered.contains("2 ->\tb := unknown"));
        assert!(rendered.contains("win.mnw(2):"));
    }
}
