//! An embedding layer that hosts WebAssembly modules inside a dynamically-typed
//! scripting engine.
//!
//! The host engine sees modules, instances and exported functions as ordinary
//! host values; guest code sees host callables as ordinary imported functions.
//! `wasm_embed` owns everything in between: module compilation caching, import
//! resolution, instantiation bookkeeping, bidirectional value marshalling, and
//! the identity-stable wrapper caches the host garbage collector traces.
//!
//! # Core Concepts
//!
//! - [`Embedder`]: The process-scoped context. Owns the guest engine and store,
//! 	the append-only module and instance registries, and the wrapper caches.
//! 	Everything is a method on it; two embedders never share state.
//!
//! - [`Value`]: The host's dynamically-typed value crossing the boundary:
//! 	numbers, arbitrary-precision integers, callables, wrapper objects.
//!
//! - [`Imports`] / [`ImportResolver`]: The namespace object consulted during
//! 	linking, a two-level `namespace.name` lookup. Missing entries become one
//! 	accumulated link error listing every unresolved import.
//!
//! - [`Deferred`]: The promise-shaped result of compile/validate/instantiate.
//! 	Settled synchronously in this embedding - the type documents the contract,
//! 	not a scheduler.
//!
//! - [`GuestScope`]: Handed to native host callables so they can call back into
//! 	guest exports while the guest is suspended in an import.
//!
//! # Example
//!
//! ```
//! use wasm_embed::{ Embedder, EmbedderConfig, Value };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut embedder = Embedder::new( EmbedderConfig::new() );
//!
//! // Compile returns a deferred that is already settled; rejection carries
//! // the compile error.
//! let module = embedder.compile( br#"(module
//! 	(func (export "add") (param i32 i32) (result i32)
//! 		local.get 0
//! 		local.get 1
//! 		i32.add))"# ).into_result()?;
//!
//! // No imports declared, so no namespace object is needed.
//! let instance = embedder.instantiate( module, None ).into_result()?;
//!
//! // Function exports come out as identity-stable host callables.
//! let add = embedder.export( instance, "add" )?;
//! let sum = embedder.call( &add, &[ Value::Number( 2.0 ), Value::Number( 3.0 )])?;
//! assert_eq!( sum, Value::Number( 5.0 ));
//! # Ok(())
//! # }
//! ```
//!
//! # Host Functions
//!
//! A guest import backed by a host callable is declared through the imports
//! object. Arguments arrive marshalled per the declared signature; whatever
//! the callable raises surfaces to the guest as a trap.
//!
//! ```
//! use wasm_embed::{ Embedder, EmbedderConfig, FunctionRef, Imports, Value };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut embedder = Embedder::new( EmbedderConfig::new() );
//!
//! let double = FunctionRef::native( "double", | _scope, arguments | {
//! 	match arguments.first() {
//! 		Some( Value::Number( x )) => Ok( Value::Number( x * 2.0 )),
//! 		_ => Ok( Value::Number( 0.0 )),
//! 	}
//! });
//! let imports = Imports::new().define( "env", "double", Value::Function( double ));
//!
//! // Instantiating raw bytes also surfaces the compiled module's handle.
//! let outcome = embedder.instantiate_bytes( br#"(module
//! 	(import "env" "double" (func $double (param i32) (result i32)))
//! 	(func (export "quadruple") (param i32) (result i32)
//! 		local.get 0
//! 		call $double
//! 		call $double))"#, Some( &imports )).into_result()?;
//!
//! let quadruple = embedder.export( outcome.instance, "quadruple" )?;
//! assert_eq!( embedder.call( &quadruple, &[ Value::Number( 4.0 )])?, Value::Number( 16.0 ));
//! # Ok(())
//! # }
//! ```
//!
//! # Marshalling
//!
//! Values convert one at a time, parameterized by the guest type, and numeric
//! kinds never cross the 32/64-bit divide: `i64` pairs with [`Value::BigInt`]
//! and nothing else, `i32`/`f32`/`f64` pair with [`Value::Number`]. 64-bit
//! round-trips are exact - the host side is an arbitrary-precision integer,
//! reduced modulo 2^64 on the way in. Function references marshal through the
//! global wrapper cache; opaque external references are not supported in
//! either direction.
//!
//! # Wrapper Identity and Garbage Collection
//!
//! Fetching the same export twice yields the *same* host object, so host-side
//! equality on exported functions behaves correctly. The caches behind this
//! hold only weak references: the embedding never keeps a wrapper alive, it
//! reports live wrappers to the host collector through
//! [`Embedder::for_each_held_reference`]. A host that fails to trace that hook
//! will see wrapper identities collected out from under live guest addresses.
//!
//! # Execution Model
//!
//! Single-threaded and cooperative: compile, link, instantiate and invoke all
//! run to completion on the calling thread. Deferred results are settled
//! before they are returned. A non-terminating guest function therefore hangs
//! the host; [`EmbedderConfig::with_instruction_limit`] bounds each guest
//! call's instruction budget, turning runaway execution into a trap.

mod bridge ;
mod embedder ;
mod host ;
mod linker ;
mod marshal ;
mod registry ;
mod store ;

#[doc( no_inline )]
pub use num_bigint::BigInt ;
#[doc( no_inline )]
pub use nonempty_collections::NEVec ;

pub use bridge::{ GuestScope, RuntimeTrap };
pub use embedder::{ Embedder, EmbedderConfig, Instantiation, InstantiationError };
pub use host::{ Deferred, FunctionRef, HostException, HostObjectRef, ImportResolver, Imports, MemoryRef, TableRef, Value };
pub use linker::{ ImportName, LinkError };
pub use marshal::MarshalError ;
pub use registry::{ CompileError, ModuleHandle };
pub use store::InstanceHandle ;
