//! Host function bridge: each direction of the call boundary.
//!
//! Host-callable-as-guest-function installs a trampoline in the guest store
//! that marshals arguments out, invokes the host callable, and marshals the
//! result back; any host-side failure surfaces to the guest as a trap.
//! Guest-function-as-host-callable hands out identity-cached wrapper objects
//! whose invocation marshals arguments in, drives the guest store's call
//! operation, and re-raises guest traps as host-visible errors.

use thiserror::Error ;
use tracing::{ debug, trace };
use wasmtime::{ AsContextMut, Caller, Func, FuncType, Store, StoreContextMut, Trap, Val, ValType };

use crate::host::{ FunctionBacking, FunctionRef, HostException, Value };
use crate::linker::{ ImportName, LinkError };
use crate::marshal ;
use crate::store::{ FuncAddr, GuestStore };



/// A guest-signaled execution fault, distinct from link and type errors.
///
/// Carries the trap reason reported by the guest store - or, for a trap
/// originating in a host-function-backed import, the text of the host
/// exception that caused it.
#[derive( Debug, Error )]
#[error( "Guest Trap: {reason}" )]
pub struct RuntimeTrap {
	reason: String,
}

impl RuntimeTrap {

	/// The reason string reported by the guest store.
	#[inline] pub fn reason( &self ) -> &str { &self.reason }

	pub(crate) fn from_error( error: &wasmtime::Error ) -> Self {
		let reason = match error.downcast_ref::<Trap>() {
			Some( trap ) => trap.to_string(),
			None => error.root_cause().to_string(),
		};
		Self { reason }
	}

}

/// A re-entrant view of the embedding, handed to native host callables.
///
/// While the guest is suspended inside a host import, the import body may
/// call back into guest exports (or other host callables) through this scope.
/// Top-level host calls go through the same path, so call semantics do not
/// depend on the entry point.
pub struct GuestScope<'a> {
	ctx: StoreContextMut<'a, GuestStore>,
}

impl<'a> GuestScope<'a> {

	pub(crate) fn new( ctx: StoreContextMut<'a, GuestStore> ) -> Self {
		Self { ctx }
	}

	/// Invokes a host-callable value.
	///
	/// # Errors
	/// Returns [`HostException::Type`] if the value is not callable, and
	/// whatever the callable itself raises - for guest exports that includes
	/// [`HostException::Trap`] and marshalling failures.
	pub fn call( &mut self, function: &Value, arguments: &[Value] ) -> Result<Value, HostException> {
		match function {
			Value::Function( function ) => self.call_function( function, arguments ),
			other => Err( HostException::Type( format!( "{} is not callable", other.kind() ))),
		}
	}

	pub(crate) fn call_function( &mut self, function: &FunctionRef, arguments: &[Value] ) -> Result<Value, HostException> {
		match function.backing() {
			FunctionBacking::Native( callable ) => callable( self, arguments ),
			FunctionBacking::Export( address ) => self.invoke_guest( *address, arguments ),
		}
	}

	/// Drives the guest store's call operation for an exported function.
	///
	/// Arguments are marshalled per the function's declared parameter types,
	/// in order; absent arguments marshal as the host's undefined (and fail
	/// for every guest type that has no undefined representation). Zero, one
	/// and many results map to undefined, the value, and an array.
	fn invoke_guest( &mut self, address: FuncAddr, arguments: &[Value] ) -> Result<Value, HostException> {
		let func = self.ctx.data().func( address );
		let signature = func.ty( &self.ctx );
		let params: Vec<ValType> = signature.params().collect();

		let mut args = Vec::with_capacity( params.len() );
		for ( index, ty ) in params.iter().enumerate() {
			let argument = arguments.get( index ).unwrap_or( &Value::Undefined );
			args.push( marshal::host_to_guest( self.ctx.data(), argument, ty )? );
		}

		if let Some( fuel ) = self.ctx.data().instruction_limit {
			self.ctx.set_fuel( fuel )
				.map_err(| error | HostException::Type( error.to_string() ))?;
		}

		trace!( address = %address, params = args.len(), results = signature.results().len(), "invoking guest function" );
		let mut results = vec![ Val::I32( 0 ); signature.results().len() ];
		func.call( &mut self.ctx, &args, &mut results ).map_err(| error | {
			let trap = RuntimeTrap::from_error( &error );
			debug!( address = %address, reason = trap.reason(), "guest function trapped" );
			trap
		})?;

		match results.as_slice() {
			[] => Ok( Value::Undefined ),
			[ result ] => Ok( marshal::guest_to_host( result )? ),
			many => many.iter()
				.map(| result | marshal::guest_to_host( result ))
				.collect::<Result<Vec<_>, _>>()
				.map( Value::Array )
				.map_err( HostException::from ),
		}
	}

}

/// Wraps a host callable as a guest function under the declared import type,
/// allocating it in the guest store and returning its address.
///
/// Host functions with more than one declared result are rejected here,
/// before the guest store ever sees them.
pub(crate) fn bind_host_function(
	store: &mut Store<GuestStore>,
	function: &FunctionRef,
	signature: &FuncType,
	import: &ImportName,
) -> Result<FuncAddr, LinkError> {

	if signature.results().len() > 1 {
		return Err( LinkError::MultiResultImport( import.clone() ));
	}
	let result_ty = signature.results().next();
	let callable = function.clone();

	let func = Func::new(
		&mut *store,
		signature.clone(),
		move | mut caller: Caller<'_, GuestStore>, params: &[Val], results: &mut [Val] | {
			invoke_host_callable( caller.as_context_mut(), &callable, result_ty.as_ref(), params, results )
				.map_err(| exception | wasmtime::Error::msg( exception.to_string() ))
		},
	);

	Ok( store.data_mut().allocate_func( func ))

}

/// Trampoline body for a host-function-backed import. Every failure - bad
/// argument marshalling, an exception from the callable, an unrepresentable
/// return value - is reported to the guest as a trap by the caller above.
fn invoke_host_callable(
	mut ctx: StoreContextMut<'_, GuestStore>,
	callable: &FunctionRef,
	result_ty: Option<&ValType>,
	params: &[Val],
	results: &mut [Val],
) -> Result<(), HostException> {

	let mut arguments = Vec::with_capacity( params.len() );
	for param in params {
		arguments.push( marshal::guest_to_host( param )? );
	}
	trace!( callable = callable.name(), params = arguments.len(), "guest invoked host function" );

	let mut scope = GuestScope::new( ctx.as_context_mut() );
	let value = scope.call_function( callable, &arguments )?;

	match ( results.len(), result_ty ) {
		( 0, _ ) => Ok(()),
		( 1, Some( ty )) => {
			results[0] = marshal::host_to_guest( ctx.data(), &value, ty )?;
			Ok(())
		}
		_ => Err( HostException::Type( "host functions with multiple results are not supported".to_string() )),
	}

}

/// Returns the host wrapper for a guest function address, creating and
/// registering it in the global cache on first sight. While any host strong
/// reference keeps the wrapper alive, every lookup of the same address
/// observes the same object.
pub(crate) fn function_wrapper( guest: &mut GuestStore, address: FuncAddr, name: &str ) -> FunctionRef {
	if let Some( cached ) = guest.global_cache.function( address ) {
		return cached ;
	}
	let wrapper = FunctionRef::export( name.to_string(), address );
	guest.global_cache.insert_function( address, &wrapper );
	wrapper
}
