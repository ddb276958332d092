//! Module registry: compiled guest modules behind stable integer handles.

use thiserror::Error ;
use tracing::debug ;
use wasmtime::{ Engine, Module };



/// Handle to a compiled module, stable for the process lifetime.
///
/// Issued by a successful compile and never reused or invalidated; the
/// registry is append-only.
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub struct ModuleHandle( usize );

impl std::fmt::Display for ModuleHandle {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> Result<(), std::fmt::Error> {
		std::fmt::Display::fmt( &self.0, f )
	}
}

/// Errors produced while compiling guest bytes into a module.
#[derive( Debug, Error )]
pub enum CompileError {
	/// The bytes could not be parsed, or parsed but failed validation.
	#[error( "Invalid Module: {0}" )] InvalidModule( String ),
}

/// Owns every module compiled so far.
pub(crate) struct ModuleRegistry {
	modules: Vec<Module>,
}

impl ModuleRegistry {

	pub(crate) fn new() -> Self {
		Self { modules: Vec::new() }
	}

	/// Parses and validates `bytes`; on success appends the module and returns
	/// its handle. A failed compile leaves the registry untouched.
	pub(crate) fn compile( &mut self, engine: &Engine, bytes: &[u8] ) -> Result<ModuleHandle, CompileError> {
		let module = Module::new( engine, bytes ).map_err(| error | {
			debug!( %error, "module rejected" );
			CompileError::InvalidModule( error.to_string() )
		})?;
		self.modules.push( module );
		let handle = ModuleHandle( self.modules.len() - 1 );
		debug!( module = %handle, "module compiled" );
		Ok( handle )
	}

	/// Runs the same compile as [`ModuleRegistry::compile`] but unconditionally
	/// discards the entry afterwards, reporting only whether it succeeded. The
	/// discarded handle is never exposed, so handle stability is preserved.
	pub(crate) fn validate( &mut self, engine: &Engine, bytes: &[u8] ) -> bool {
		match self.compile( engine, bytes ) {
			Ok( _ ) => {
				self.modules.pop();
				true
			}
			Err( _ ) => false,
		}
	}

	/// Resolves a handle. Handles are only ever minted by [`ModuleRegistry::compile`],
	/// so an unknown handle is a broken invariant and panics.
	pub(crate) fn module( &self, handle: ModuleHandle ) -> &Module {
		self.modules.get( handle.0 ).expect( "module handle was never issued by this registry" )
	}

	pub(crate) fn len( &self ) -> usize { self.modules.len() }

}
