//! The process-scoped embedding context and its host-facing operations.
//!
//! An [`Embedder`] owns the guest engine, the guest store, and the module
//! registry. Every operation is a method on it; there is no ambient global
//! state, so two embedders in one process are fully independent.

use pipe_trait::Pipe ;
use thiserror::Error ;
use tracing::debug ;
use wasmtime::{ AsContextMut, Config, Engine, Extern, Instance, Memory, MemoryType, Store, Trap };

use crate::bridge::{ self, GuestScope, RuntimeTrap };
use crate::host::{ Deferred, HostException, HostObjectRef, ImportResolver, MemoryRef, TableRef, Value };
use crate::linker::{ self, LinkError };
use crate::marshal ;
use crate::registry::{ ModuleHandle, ModuleRegistry };
use crate::store::{ ExternAddr, GuestStore, InstanceHandle };



/// Errors produced while driving a compiled module to an instance.
///
/// A failed instantiation registers nothing: no instance handle, no cache.
#[derive( Debug, Error )]
pub enum InstantiationError {
	/// Import resolution failed before the guest store was asked to
	/// instantiate, or the guest store rejected the resolved imports.
	#[error( transparent )] Link( #[from] LinkError ),
	/// The guest store trapped while instantiating, e.g. in the module's
	/// start function.
	#[error( transparent )] Trap( #[from] RuntimeTrap ),
}

/// Configuration for an [`Embedder`].
#[derive( Clone, Debug, Default )]
pub struct EmbedderConfig {
	instruction_limit: Option<u64>,
}

impl EmbedderConfig {

	pub fn new() -> Self { Self::default() }

	/// Bounds every guest call to roughly this many instructions.
	///
	/// A call that exhausts the budget traps. Without a limit, a
	/// non-terminating guest function hangs the cooperative thread; that is
	/// an inherent risk of the embedding, and this is the only guard offered.
	pub fn with_instruction_limit( mut self, limit: u64 ) -> Self {
		self.instruction_limit = Some( limit );
		self
	}

}

/// The result of instantiating raw bytes: the instance together with the
/// module that was compiled on the way. The module handle is only surfaced
/// on this path; instantiating a previously-compiled handle yields just the
/// instance.
#[derive( Copy, Clone, Debug )]
pub struct Instantiation {
	pub instance: InstanceHandle,
	pub module: ModuleHandle,
}

/// The embedding context: guest engine, guest store, module registry.
pub struct Embedder {
	engine: Engine,
	store: Store<GuestStore>,
	modules: ModuleRegistry,
}

impl Embedder {

	pub fn new( config: EmbedderConfig ) -> Self {
		let engine = match config.instruction_limit {
			Some( _ ) => {
				let mut engine_config = Config::new();
				engine_config.consume_fuel( true );
				Engine::new( &engine_config ).expect( "fuel metering is a supported engine option" )
			}
			None => Engine::default(),
		};
		let store = Store::new( &engine, GuestStore::new( config.instruction_limit ));
		Self { engine, store, modules: ModuleRegistry::new() }
	}

	/// Compiles guest bytes into a module behind a stable handle.
	///
	/// The deferred is settled before this returns; rejection carries
	/// [`HostException::Compile`]. A failed compile leaves the module
	/// registry untouched.
	pub fn compile( &mut self, bytes: &[u8] ) -> Deferred<ModuleHandle> {
		match self.modules.compile( &self.engine, bytes ) {
			Ok( handle ) => Deferred::resolve( handle ),
			Err( error ) => Deferred::reject( error ),
		}
	}

	/// Reports whether `bytes` compile and validate as a guest module.
	///
	/// Runs the same compile as [`Embedder::compile`] but always discards the
	/// result; the registry is left exactly as it was in every outcome.
	pub fn validate( &mut self, bytes: &[u8] ) -> Deferred<bool> {
		self.modules.validate( &self.engine, bytes ).pipe( Deferred::resolve )
	}

	/// Instantiates a previously-compiled module.
	///
	/// Sequence: look up the module, resolve its imports, hand module and
	/// resolved imports to the guest store, register the result together with
	/// a fresh per-instance wrapper cache. Each step short-circuits; a failed
	/// attempt leaves no partial instance behind.
	pub fn instantiate( &mut self, module: ModuleHandle, imports: Option<&dyn ImportResolver> ) -> Deferred<InstanceHandle> {
		match self.instantiate_module( module, imports ) {
			Ok( instance ) => Deferred::resolve( instance ),
			Err( error ) => Deferred::reject( error ),
		}
	}

	/// Compiles `bytes` and instantiates the result in one operation,
	/// additionally surfacing the compiled module's handle.
	pub fn instantiate_bytes( &mut self, bytes: &[u8], imports: Option<&dyn ImportResolver> ) -> Deferred<Instantiation> {
		let module = match self.modules.compile( &self.engine, bytes ) {
			Ok( module ) => module,
			Err( error ) => return Deferred::reject( error ),
		};
		match self.instantiate_module( module, imports ) {
			Ok( instance ) => Deferred::resolve( Instantiation { instance, module }),
			Err( error ) => Deferred::reject( error ),
		}
	}

	fn instantiate_module( &mut self, handle: ModuleHandle, imports: Option<&dyn ImportResolver> ) -> Result<InstanceHandle, InstantiationError> {
		let module = self.modules.module( handle ).clone();
		let resolved = linker::resolve( &mut self.store, &module, imports )?;
		let externs: Vec<Extern> = resolved.addresses.iter()
			.map(| address | self.store.data().extern_of( *address ))
			.collect();

		// The start function runs guest code during instantiation, so the
		// instruction budget applies here as well.
		if let Some( fuel ) = self.store.data().instruction_limit {
			self.store.set_fuel( fuel ).expect( "fuel metering is enabled together with the instruction limit" );
		}

		let instance = Instance::new( &mut self.store, &module, &externs )
			.map_err(| error | match error.downcast_ref::<Trap>() {
				Some( _ ) => InstantiationError::Trap( RuntimeTrap::from_error( &error )),
				None => InstantiationError::Link( LinkError::Incompatible( error.to_string() )),
			})?;

		let exports = self.intern_exports( &instance );
		let handle = self.store.data_mut().register_instance( exports );
		debug!( instance = %handle, module = %module.name().unwrap_or( "<unnamed>" ), "module instantiated" );
		Ok( handle )
	}

	/// Interns every export of a fresh instance into the guest store arenas,
	/// producing the instance's name-to-address table.
	fn intern_exports( &mut self, instance: &Instance ) -> Vec<( String, ExternAddr )> {
		let externs: Vec<( String, Extern )> = instance.exports( &mut self.store )
			.map(| export | ( export.name().to_string(), export.into_extern() ))
			.collect();

		let guest = self.store.data_mut();
		let mut exports = Vec::with_capacity( externs.len() );
		for ( name, value ) in externs {
			let address = match value {
				Extern::Func( func ) => ExternAddr::Func( guest.allocate_func( func )),
				Extern::Global( global ) => ExternAddr::Global( guest.allocate_global( global )),
				Extern::Memory( memory ) => ExternAddr::Memory( guest.allocate_memory( memory )),
				Extern::Table( table ) => ExternAddr::Table( guest.allocate_table( table )),
				_ => {
					debug!( export = %name, "skipping export of unsupported kind" );
					continue ;
				}
			};
			exports.push(( name, address ));
		}
		exports
	}

	/// Looks up one export of an instance as a host value.
	///
	/// Function exports yield identity-cached wrappers from the global cache;
	/// memory and table exports yield identity-cached wrappers from the
	/// instance's cache; global exports yield the marshalled current value.
	pub fn export( &mut self, instance: InstanceHandle, name: &str ) -> Result<Value, HostException> {
		let Some( address ) = self.store.data().instance( instance ).export( name ) else {
			return Err( HostException::Type( format!( "{name} is not an export of this instance" )));
		};
		match address {
			ExternAddr::Func( address ) => {
				let wrapper = bridge::function_wrapper( self.store.data_mut(), address, name );
				self.store.data_mut().instance_cache_mut( instance ).insert_function( address, &wrapper );
				Ok( Value::Function( wrapper ))
			}
			ExternAddr::Memory( address ) => {
				let cache = self.store.data_mut().instance_cache_mut( instance );
				if let Some( cached ) = cache.memory( address ) {
					return Ok( Value::Memory( cached ));
				}
				let wrapper = MemoryRef::new( address );
				cache.insert_memory( address, &wrapper );
				Ok( Value::Memory( wrapper ))
			}
			ExternAddr::Table( address ) => {
				let cache = self.store.data_mut().instance_cache_mut( instance );
				if let Some( cached ) = cache.table( address ) {
					return Ok( Value::Table( cached ));
				}
				let wrapper = TableRef::new( address );
				cache.insert_table( address, &wrapper );
				Ok( Value::Table( wrapper ))
			}
			ExternAddr::Global( address ) => {
				let global = self.store.data().global( address );
				let value = global.get( &mut self.store );
				marshal::guest_to_host( &value ).map_err( HostException::from )
			}
		}
	}

	/// The names of every export of an instance, in declared order.
	pub fn export_names( &self, instance: InstanceHandle ) -> Vec<String> {
		self.store.data().instance( instance ).export_names().map( str::to_string ).collect()
	}

	/// Invokes a host-callable value from the host.
	///
	/// # Errors
	/// [`HostException::Type`] if the value is not callable; for guest-export
	/// wrappers, [`HostException::Trap`] on a guest trap and marshalling
	/// errors for unrepresentable arguments or results.
	pub fn call( &mut self, function: &Value, arguments: &[Value] ) -> Result<Value, HostException> {
		GuestScope::new( self.store.as_context_mut() ).call( function, arguments )
	}

	/// Allocates a fresh guest linear memory and returns its host wrapper,
	/// suitable for satisfying a memory import.
	pub fn create_memory( &mut self, initial: u32, maximum: Option<u32> ) -> Result<Value, HostException> {
		let memory = Memory::new( &mut self.store, MemoryType::new( initial, maximum ))
			.map_err(| error | HostException::Type( error.to_string() ))?;
		let address = self.store.data_mut().allocate_memory( memory );
		Ok( Value::Memory( MemoryRef::new( address )))
	}

	/// Visits every live wrapper object held (weakly) by the caches, global
	/// and per-instance.
	///
	/// The host collector must call this during reachability analysis and
	/// treat each visited reference as an edge from the embedding; the caches
	/// themselves hold no strong references, so a wrapper that is neither
	/// rooted by the host nor reported here is gone.
	pub fn for_each_held_reference( &self, mut visit: impl FnMut( HostObjectRef )) {
		self.store.data().for_each_held_reference( &mut visit );
	}

	/// The number of modules currently held by the registry.
	pub fn module_count( &self ) -> usize { self.modules.len() }

	/// The number of instances registered so far.
	pub fn instance_count( &self ) -> usize { self.store.data().instance_count() }

}

impl Default for Embedder {
	fn default() -> Self { Self::new( EmbedderConfig::new() )}
}
