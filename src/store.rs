//! Guest store adapter: address arenas, instances, and wrapper caches.
//!
//! The guest VM hands out opaque handles with no stable identity of their own,
//! so the embedding owns an address space over them: every function, global,
//! memory and table the embedding touches is interned into an append-only
//! arena and referred to by its integer address from then on. Addresses are
//! never reused or invalidated for the process lifetime.
//!
//! This struct is installed as the wasmtime `Store`'s data so that host
//! import trampolines can reach the arenas and caches mid-call through the
//! caller context.

use std::collections::HashMap ;
use std::sync::Weak ;

use wasmtime::{ Extern, Func, Global, Memory, Table };

use crate::host::{ FunctionObject, FunctionRef, HostObjectRef, MemoryObject, MemoryRef, TableObject, TableRef };



/// Address of a function in the guest store.
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub(crate) struct FuncAddr( usize );

/// Address of a global in the guest store.
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub(crate) struct GlobalAddr( usize );

/// Address of a linear memory in the guest store.
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub(crate) struct MemoryAddr( usize );

/// Address of a table in the guest store.
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub(crate) struct TableAddr( usize );

impl std::fmt::Display for FuncAddr {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> Result<(), std::fmt::Error> {
		std::fmt::Display::fmt( &self.0, f )
	}
}

/// Address of any extern kind, as resolved by the linker.
#[derive( Copy, Clone, Debug, Eq, PartialEq )]
pub(crate) enum ExternAddr {
	Func( FuncAddr ),
	Global( GlobalAddr ),
	Memory( MemoryAddr ),
	Table( TableAddr ),
}

/// Handle to an instantiated module, stable for the process lifetime.
#[derive( Copy, Clone, Debug, Eq, Hash, PartialEq )]
pub struct InstanceHandle( usize );

impl std::fmt::Display for InstanceHandle {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> Result<(), std::fmt::Error> {
		std::fmt::Display::fmt( &self.0, f )
	}
}

/// A successfully instantiated module: its exports as named addresses.
pub(crate) struct ModuleInstance {
	exports: Vec<( String, ExternAddr )>,
}

impl ModuleInstance {

	pub(crate) fn export( &self, name: &str ) -> Option<ExternAddr> {
		self.exports.iter().find(| entry | entry.0 == name ).map(| entry | entry.1 )
	}

	pub(crate) fn export_names( &self ) -> impl Iterator<Item = &str> {
		self.exports.iter().map(| entry | entry.0.as_str() )
	}

}

/// Address-keyed weak map from guest addresses to host wrapper objects.
///
/// A lookup returns the cached wrapper for as long as any host strong
/// reference keeps it alive, so repeated lookups observe one identity. The
/// cache itself never extends a wrapper's lifetime; liveness is reported to
/// the host collector through [`GuestStore::for_each_held_reference`].
#[derive( Default )]
pub(crate) struct WrapperCache {
	functions: HashMap<FuncAddr, Weak<FunctionObject>>,
	memories: HashMap<MemoryAddr, Weak<MemoryObject>>,
	tables: HashMap<TableAddr, Weak<TableObject>>,
}

impl WrapperCache {

	pub(crate) fn function( &self, address: FuncAddr ) -> Option<FunctionRef> {
		self.functions.get( &address ).and_then( Weak::upgrade ).map( FunctionRef )
	}

	pub(crate) fn insert_function( &mut self, address: FuncAddr, wrapper: &FunctionRef ) {
		self.functions.insert( address, wrapper.downgrade() );
	}

	pub(crate) fn memory( &self, address: MemoryAddr ) -> Option<MemoryRef> {
		self.memories.get( &address ).and_then( Weak::upgrade ).map( MemoryRef )
	}

	pub(crate) fn insert_memory( &mut self, address: MemoryAddr, wrapper: &MemoryRef ) {
		self.memories.insert( address, wrapper.downgrade() );
	}

	pub(crate) fn table( &self, address: TableAddr ) -> Option<TableRef> {
		self.tables.get( &address ).and_then( Weak::upgrade ).map( TableRef )
	}

	pub(crate) fn insert_table( &mut self, address: TableAddr, wrapper: &TableRef ) {
		self.tables.insert( address, wrapper.downgrade() );
	}

	fn for_each_live( &self, visit: &mut dyn FnMut( HostObjectRef )) {
		for wrapper in self.functions.values().filter_map( Weak::upgrade ) {
			visit( HostObjectRef::Function( FunctionRef( wrapper )));
		}
		for wrapper in self.memories.values().filter_map( Weak::upgrade ) {
			visit( HostObjectRef::Memory( MemoryRef( wrapper )));
		}
		for wrapper in self.tables.values().filter_map( Weak::upgrade ) {
			visit( HostObjectRef::Table( TableRef( wrapper )));
		}
	}

}

/// The embedding's view of the guest store, installed as the wasmtime
/// `Store`'s data.
///
/// Arenas and the instance list are append-only; an address handed out once
/// resolves to the same underlying object forever. Looking up an address that
/// was never issued is a broken invariant inside the embedding, not user
/// input, and panics.
pub(crate) struct GuestStore {
	funcs: Vec<Func>,
	globals: Vec<Global>,
	memories: Vec<Memory>,
	tables: Vec<Table>,
	instances: Vec<ModuleInstance>,
	instance_caches: Vec<WrapperCache>,
	pub(crate) global_cache: WrapperCache,
	pub(crate) instruction_limit: Option<u64>,
}

impl GuestStore {

	pub(crate) fn new( instruction_limit: Option<u64> ) -> Self {
		Self {
			funcs: Vec::new(),
			globals: Vec::new(),
			memories: Vec::new(),
			tables: Vec::new(),
			instances: Vec::new(),
			instance_caches: Vec::new(),
			global_cache: WrapperCache::default(),
			instruction_limit,
		}
	}

	pub(crate) fn allocate_func( &mut self, func: Func ) -> FuncAddr {
		self.funcs.push( func );
		FuncAddr( self.funcs.len() - 1 )
	}

	pub(crate) fn allocate_global( &mut self, global: Global ) -> GlobalAddr {
		self.globals.push( global );
		GlobalAddr( self.globals.len() - 1 )
	}

	pub(crate) fn allocate_memory( &mut self, memory: Memory ) -> MemoryAddr {
		self.memories.push( memory );
		MemoryAddr( self.memories.len() - 1 )
	}

	pub(crate) fn allocate_table( &mut self, table: Table ) -> TableAddr {
		self.tables.push( table );
		TableAddr( self.tables.len() - 1 )
	}

	pub(crate) fn func( &self, address: FuncAddr ) -> Func {
		self.funcs.get( address.0 ).cloned().expect( "function address was never issued by this store" )
	}

	pub(crate) fn global( &self, address: GlobalAddr ) -> Global {
		self.globals.get( address.0 ).cloned().expect( "global address was never issued by this store" )
	}

	pub(crate) fn memory( &self, address: MemoryAddr ) -> Memory {
		self.memories.get( address.0 ).cloned().expect( "memory address was never issued by this store" )
	}

	pub(crate) fn table( &self, address: TableAddr ) -> Table {
		self.tables.get( address.0 ).cloned().expect( "table address was never issued by this store" )
	}

	pub(crate) fn extern_of( &self, address: ExternAddr ) -> Extern {
		match address {
			ExternAddr::Func( address ) => Extern::Func( self.func( address )),
			ExternAddr::Global( address ) => Extern::Global( self.global( address )),
			ExternAddr::Memory( address ) => Extern::Memory( self.memory( address )),
			ExternAddr::Table( address ) => Extern::Table( self.table( address )),
		}
	}

	/// Registers a fresh instance together with its empty per-instance cache.
	pub(crate) fn register_instance( &mut self, exports: Vec<( String, ExternAddr )> ) -> InstanceHandle {
		self.instances.push( ModuleInstance { exports });
		self.instance_caches.push( WrapperCache::default() );
		InstanceHandle( self.instances.len() - 1 )
	}

	pub(crate) fn instance( &self, handle: InstanceHandle ) -> &ModuleInstance {
		self.instances.get( handle.0 ).expect( "instance handle was never issued by this store" )
	}

	pub(crate) fn instance_cache_mut( &mut self, handle: InstanceHandle ) -> &mut WrapperCache {
		self.instance_caches.get_mut( handle.0 ).expect( "instance handle was never issued by this store" )
	}

	pub(crate) fn instance_count( &self ) -> usize { self.instances.len() }

	/// Visits every live wrapper reachable through any cache, global or
	/// per-instance. The host collector calls this during reachability
	/// analysis; a wrapper not reported here may be collected even while the
	/// guest can still hand out its address.
	pub(crate) fn for_each_held_reference( &self, visit: &mut dyn FnMut( HostObjectRef )) {
		self.global_cache.for_each_live( visit );
		for cache in &self.instance_caches {
			cache.for_each_live( visit );
		}
	}

}
