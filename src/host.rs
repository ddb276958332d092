//! Host engine value model and narrow interfaces.
//!
//! The embedding core never touches the host engine's object system directly.
//! It consumes a small surface instead: the dynamically-typed [`Value`]
//! representation, reference-counted wrapper objects whose identity is pointer
//! identity, a two-level [`ImportResolver`] lookup, and the deferred-result
//! shape the host expects from compile/instantiate operations. Host engines
//! with a richer object model implement [`ImportResolver`] over their own
//! property lookup and treat [`Value`] as the marshalling boundary.

use std::collections::HashMap ;
use std::sync::{ Arc, Weak };

use num_bigint::BigInt ;
use thiserror::Error ;

use crate::bridge::{ GuestScope, RuntimeTrap };
use crate::embedder::InstantiationError ;
use crate::linker::LinkError ;
use crate::marshal::MarshalError ;
use crate::registry::CompileError ;
use crate::store::{ FuncAddr, MemoryAddr, TableAddr };



/// A host-engine value crossing the embedding boundary.
///
/// This is the closed set of host representations the marshaller understands:
/// plain double-precision numbers, arbitrary-precision integers (the host's
/// 64-bit-capable value), callables, guest wrapper objects, and the array
/// aggregate used for multi-result returns.
#[derive( Clone, Debug )]
pub enum Value {
	/// The host's "no value" value, returned by zero-result guest calls.
	Undefined,
	/// The host's null, marshalled to and from null function references.
	Null,
	/// A double-precision number.
	Number( f64 ),
	/// An arbitrary-precision integer, required wherever the guest expects i64.
	BigInt( BigInt ),
	/// A host-callable function, native or wrapping a guest export.
	Function( FunctionRef ),
	/// A wrapper around a guest linear memory.
	Memory( MemoryRef ),
	/// A wrapper around a guest table.
	Table( TableRef ),
	/// An ordered aggregate, used for guest calls returning more than one value.
	Array( Vec<Value> ),
}

impl Value {
	/// A short kind name for error messages.
	pub(crate) fn kind( &self ) -> &'static str { match self {
		Self::Undefined => "undefined",
		Self::Null => "null",
		Self::Number( _ ) => "a Number",
		Self::BigInt( _ ) => "a BigInteger",
		Self::Function( _ ) => "a Function",
		Self::Memory( _ ) => "a Memory",
		Self::Table( _ ) => "a Table",
		Self::Array( _ ) => "an Array",
	}}

	/// Returns `true` if calling this value through [`GuestScope::call`] can succeed.
	#[inline] pub fn is_callable( &self ) -> bool { matches!( self, Self::Function( _ ))}
}

impl PartialEq for Value {
	/// Structural equality for plain values, identity for wrapper objects.
	fn eq( &self, other: &Self ) -> bool { match ( self, other ) {
		( Self::Undefined, Self::Undefined ) | ( Self::Null, Self::Null ) => true,
		( Self::Number( a ), Self::Number( b )) => a == b,
		( Self::BigInt( a ), Self::BigInt( b )) => a == b,
		( Self::Function( a ), Self::Function( b )) => FunctionRef::ptr_eq( a, b ),
		( Self::Memory( a ), Self::Memory( b )) => MemoryRef::ptr_eq( a, b ),
		( Self::Table( a ), Self::Table( b )) => TableRef::ptr_eq( a, b ),
		( Self::Array( a ), Self::Array( b )) => a == b,
		_ => false,
	}}
}

/// The callable backing a [`FunctionRef`].
pub(crate) enum FunctionBacking {
	/// A native host callable, invoked with a re-entrant [`GuestScope`].
	Native( Box<dyn Fn( &mut GuestScope<'_>, &[Value] ) -> Result<Value, HostException> + Send + Sync> ),
	/// A guest function known to the embedding by its store address.
	Export( FuncAddr ),
}

/// A heap-allocated host function object.
///
/// Identity is the allocation: two [`FunctionRef`]s compare equal exactly when
/// they point at the same `FunctionObject`.
pub struct FunctionObject {
	pub(crate) name: String,
	pub(crate) backing: FunctionBacking,
}

/// A reference-counted handle to a host function object.
///
/// Cloning the handle never clones the object; the wrapper caches hold
/// [`Weak`] counterparts of these handles so that cached wrappers keep their
/// identity without the cache extending their lifetime.
#[derive( Clone )]
pub struct FunctionRef( pub(crate) Arc<FunctionObject> );

impl FunctionRef {

	/// Creates a native host function.
	///
	/// The callable receives a [`GuestScope`] so it may call back into guest
	/// exports while the guest is suspended in a host import.
	pub fn native(
		name: impl Into<String>,
		callable: impl Fn( &mut GuestScope<'_>, &[Value] ) -> Result<Value, HostException> + Send + Sync + 'static,
	) -> Self {
		Self( Arc::new( FunctionObject {
			name: name.into(),
			backing: FunctionBacking::Native( Box::new( callable )),
		}))
	}

	/// Wraps a guest function address. Callers must register the wrapper in the
	/// global cache to preserve identity; see the bridge.
	pub(crate) fn export( name: String, address: FuncAddr ) -> Self {
		Self( Arc::new( FunctionObject { name, backing: FunctionBacking::Export( address )}))
	}

	/// The function's name, as exported or as given at construction.
	#[inline] pub fn name( &self ) -> &str { &self.0.name }

	/// Reference identity.
	#[inline] pub fn ptr_eq( a: &Self, b: &Self ) -> bool { Arc::ptr_eq( &a.0, &b.0 )}

	/// The guest address this wrapper was created from, if it wraps an export.
	pub(crate) fn export_address( &self ) -> Option<FuncAddr> { match self.0.backing {
		FunctionBacking::Export( address ) => Some( address ),
		FunctionBacking::Native( _ ) => None,
	}}

	pub(crate) fn backing( &self ) -> &FunctionBacking { &self.0.backing }

	pub(crate) fn downgrade( &self ) -> Weak<FunctionObject> { Arc::downgrade( &self.0 )}

}

impl std::fmt::Debug for FunctionRef {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "FunctionRef" )
			.field( "name", &self.0.name )
			.field( "backing", &match self.0.backing {
				FunctionBacking::Native( _ ) => "<native>",
				FunctionBacking::Export( _ ) => "<guest export>",
			})
			.finish()
	}
}

/// A heap-allocated wrapper around a guest linear memory.
#[derive( Debug )]
pub struct MemoryObject { pub(crate) address: MemoryAddr }

/// A reference-counted handle to a memory wrapper; identity is the allocation.
#[derive( Clone, Debug )]
pub struct MemoryRef( pub(crate) Arc<MemoryObject> );

impl MemoryRef {
	pub(crate) fn new( address: MemoryAddr ) -> Self { Self( Arc::new( MemoryObject { address }))}
	#[inline] pub fn ptr_eq( a: &Self, b: &Self ) -> bool { Arc::ptr_eq( &a.0, &b.0 )}
	pub(crate) fn address( &self ) -> MemoryAddr { self.0.address }
	pub(crate) fn downgrade( &self ) -> Weak<MemoryObject> { Arc::downgrade( &self.0 )}
}

/// A heap-allocated wrapper around a guest table.
#[derive( Debug )]
pub struct TableObject { pub(crate) address: TableAddr }

/// A reference-counted handle to a table wrapper; identity is the allocation.
#[derive( Clone, Debug )]
pub struct TableRef( pub(crate) Arc<TableObject> );

impl TableRef {
	pub(crate) fn new( address: TableAddr ) -> Self { Self( Arc::new( TableObject { address }))}
	#[inline] pub fn ptr_eq( a: &Self, b: &Self ) -> bool { Arc::ptr_eq( &a.0, &b.0 )}
	pub(crate) fn address( &self ) -> TableAddr { self.0.address }
	pub(crate) fn downgrade( &self ) -> Weak<TableObject> { Arc::downgrade( &self.0 )}
}

/// A strong reference handed to the host garbage collector by the trace hook.
///
/// The caches only hold weak references; during reachability analysis the
/// collector receives one of these for every wrapper that is still live, and
/// is expected to treat it as an edge from the embedding.
#[derive( Clone, Debug )]
pub enum HostObjectRef {
	Function( FunctionRef ),
	Memory( MemoryRef ),
	Table( TableRef ),
}

/// The host-visible error object.
///
/// Every failure the embedding surfaces to the host - a rejected deferred
/// result, a trapped call, a marshalling mismatch - is one of these.
#[derive( Debug, Error )]
pub enum HostException {
	/// The bytes were not a valid guest module.
	#[error( transparent )] Compile( #[from] CompileError ),
	/// Import resolution failed.
	#[error( transparent )] Link( #[from] LinkError ),
	/// The guest store rejected instantiation.
	#[error( transparent )] Instantiation( #[from] InstantiationError ),
	/// Guest execution trapped.
	#[error( transparent )] Trap( #[from] RuntimeTrap ),
	/// A value could not be represented in the target type.
	#[error( transparent )] Marshal( #[from] MarshalError ),
	/// A value had the wrong shape for the requested operation.
	#[error( "Type Error: {0}" )] Type( String ),
}

/// A deferred operation result.
///
/// Mirrors the promise-like surface the host expects from compile and
/// instantiate operations. In this embedding every deferred is settled
/// synchronously, before the operation returns; the type keeps the external
/// contract honest about which operations are allowed to become asynchronous
/// without hiding the fact that none currently are.
#[must_use = "a deferred result carries the operation's outcome"]
#[derive( Debug )]
pub struct Deferred<T>( Result<T, HostException> );

impl<T> Deferred<T> {

	pub(crate) fn resolve( value: T ) -> Self { Self( Ok( value ))}

	pub(crate) fn reject( error: impl Into<HostException> ) -> Self { Self( Err( error.into() ))}

	/// The settled outcome. Always available; no deferred is ever pending.
	#[inline] pub fn settled( &self ) -> Result<&T, &HostException> { self.0.as_ref() }

	/// Consumes the deferred into its outcome.
	#[inline] pub fn into_result( self ) -> Result<T, HostException> { self.0 }

	#[inline] pub fn is_rejected( &self ) -> bool { self.0.is_err() }

}

/// Two-level import lookup: `namespace_object[namespace][name]`.
///
/// Absence at either level is `None` - the linker reports it as a missing
/// import rather than an engine error, matching how a host property lookup
/// that finds nothing behaves.
pub trait ImportResolver {
	/// Looks up one import slot.
	fn resolve( &self, namespace: &str, name: &str ) -> Option<Value> ;
}

/// A plain nested-map import namespace object.
///
/// ```
/// use wasm_embed::{ Imports, Value };
///
/// let imports = Imports::new()
/// 	.define( "env", "answer", Value::Number( 42.0 ));
/// ```
#[derive( Clone, Debug, Default )]
pub struct Imports( HashMap<String, HashMap<String, Value>> );

impl Imports {

	pub fn new() -> Self { Self::default() }

	/// Defines `namespace.name`, replacing any previous definition.
	pub fn define( mut self, namespace: impl Into<String>, name: impl Into<String>, value: Value ) -> Self {
		self.0.entry( namespace.into() ).or_default().insert( name.into(), value );
		self
	}

}

impl ImportResolver for Imports {
	fn resolve( &self, namespace: &str, name: &str ) -> Option<Value> {
		self.0.get( namespace )?.get( name ).cloned()
	}
}
