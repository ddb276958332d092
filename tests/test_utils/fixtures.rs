#[allow( dead_code )]
mod fixtures {

	use wasm_embed::{ Embedder, EmbedderConfig, ImportResolver, InstanceHandle, ModuleHandle };

	/// Two-argument addition, no imports.
	pub const ADD: &str = r#"(module
		(func (export "add") (param i32 i32) (result i32)
			local.get 0
			local.get 1
			i32.add))"#;

	/// Calls the imported `env.double` once.
	pub const CALLS_DOUBLE: &str = r#"(module
		(import "env" "double" (func $double (param i32) (result i32)))
		(func (export "apply") (param i32) (result i32)
			local.get 0
			call $double))"#;

	/// Declares two function imports and nothing else.
	pub const TWO_MISSING: &str = r#"(module
		(import "env" "foo" (func))
		(import "env" "bar" (func)))"#;

	/// Declares one function import.
	pub const ONE_MISSING: &str = r#"(module
		(import "env" "foo" (func)))"#;

	/// Imports a 64-bit global and exports its value.
	pub const I64_GLOBAL: &str = r#"(module
		(import "env" "g" (global i64))
		(func (export "get") (result i64)
			global.get 0))"#;

	/// Imports a 32-bit global and exports its value.
	pub const I32_GLOBAL: &str = r#"(module
		(import "env" "n" (global i32))
		(func (export "get") (result i32)
			global.get 0))"#;

	/// Identity functions over each numeric value type.
	pub const ECHO: &str = r#"(module
		(func (export "echo-i32") (param i32) (result i32) local.get 0)
		(func (export "echo-i64") (param i64) (result i64) local.get 0)
		(func (export "echo-f32") (param f32) (result f32) local.get 0)
		(func (export "echo-f64") (param f64) (result f64) local.get 0))"#;

	/// Traps in its start function.
	pub const START_TRAP: &str = r#"(module
		(func $boom
			unreachable)
		(start $boom))"#;

	/// Exports a function that traps immediately.
	pub const TRAPPING: &str = r#"(module
		(func (export "boom")
			unreachable))"#;

	/// Exports a memory and a function writing a marker into it.
	pub const MEMORY_EXPORT: &str = r#"(module
		(memory (export "mem") 1)
		(func (export "poke")
			i32.const 0
			i32.const 42
			i32.store))"#;

	/// Imports a memory and exports a function reading the marker back.
	pub const MEMORY_IMPORT: &str = r#"(module
		(import "env" "mem" (memory 1))
		(func (export "peek") (result i32)
			i32.const 0
			i32.load))"#;

	/// Imports a table.
	pub const TABLE_IMPORT: &str = r#"(module
		(import "env" "t" (table 1 funcref)))"#;

	/// Returns two values at once.
	pub const PAIR: &str = r#"(module
		(func (export "pair") (result i32 i32)
			i32.const 1
			i32.const 2))"#;

	/// Function-reference producers and a null check.
	pub const FUNCREF: &str = r#"(module
		(func $seven (export "seven") (result i32) i32.const 7)
		(elem declare func $seven)
		(func (export "get-seven") (result funcref)
			ref.func $seven)
		(func (export "get-null") (result funcref)
			ref.null func)
		(func (export "is-null") (param funcref) (result i32)
			local.get 0
			ref.is_null))"#;

	/// Imports a mutable 64-bit global, exporting read and increment access.
	pub const MUT_I64_GLOBAL: &str = r#"(module
		(import "env" "g" (global $g (mut i64)))
		(func (export "get") (result i64)
			global.get $g)
		(func (export "bump")
			global.get $g
			i64.const 1
			i64.add
			global.set $g))"#;

	/// Exports one global of each integer width.
	pub const GLOBAL_EXPORTS: &str = r#"(module
		(global (export "answer") i32 (i32.const 42))
		(global (export "big") i64 (i64.const -7)))"#;

	/// Loops forever.
	pub const SPIN: &str = r#"(module
		(func (export "spin")
			(loop $forever
				br $forever)))"#;

	/// Adds one, no imports.
	pub const INC: &str = r#"(module
		(func (export "inc") (param i32) (result i32)
			local.get 0
			i32.const 1
			i32.add))"#;

	/// Calls the imported `env.inc` once.
	pub const CALLS_INC: &str = r#"(module
		(import "env" "inc" (func $inc (param i32) (result i32)))
		(func (export "call-inc") (param i32) (result i32)
			local.get 0
			call $inc))"#;

	/// Calls the imported `env.transform` once.
	pub const CALLS_TRANSFORM: &str = r#"(module
		(import "env" "transform" (func $transform (param i32) (result i32)))
		(func (export "run") (param i32) (result i32)
			local.get 0
			call $transform))"#;

	/// Declares a function import with two results.
	pub const MULTI_RESULT_IMPORT: &str = r#"(module
		(import "env" "pair" (func (result i32 i32))))"#;

	/// Routes embedding trace output into the test harness's captured output.
	/// Repeated calls are fine; only the first subscriber wins.
	pub fn init_tracing() {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	}

	pub fn embedder() -> Embedder {
		init_tracing();
		Embedder::new( EmbedderConfig::new() )
	}

	pub fn compile( embedder: &mut Embedder, wat: &str ) -> ModuleHandle {
		embedder.compile( wat.as_bytes() ).into_result()
			.expect( "Failed to compile fixture module" )
	}

	pub fn instantiate( embedder: &mut Embedder, wat: &str ) -> InstanceHandle {
		let module = compile( embedder, wat );
		embedder.instantiate( module, None ).into_result()
			.expect( "Failed to instantiate fixture module" )
	}

	pub fn instantiate_with( embedder: &mut Embedder, wat: &str, imports: &dyn ImportResolver ) -> InstanceHandle {
		let module = compile( embedder, wat );
		embedder.instantiate( module, Some( imports )).into_result()
			.expect( "Failed to instantiate fixture module" )
	}

}
