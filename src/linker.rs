//! Import resolution: from a host namespace object to guest store addresses.
//!
//! Imports are walked in the module's declared order. Lookup misses are
//! accumulated across the whole import list so a caller sees every missing
//! name in one error; kind and type mismatches abort immediately. Nothing is
//! handed to the guest store's instantiate operation unless every import
//! resolved.

use itertools::Itertools ;
use nonempty_collections::{ NEVec, NonEmptyIterator };
use thiserror::Error ;
use tracing::debug ;
use wasmtime::{ ExternType, Global, GlobalType, Module, Store, ValType };

use crate::bridge ;
use crate::host::{ ImportResolver, Value };
use crate::marshal::{ self, MarshalError };
use crate::store::{ ExternAddr, GlobalAddr, GuestStore };



/// One declared import slot of a module.
#[derive( Clone, Debug, Eq, Hash, PartialEq )]
pub struct ImportName {
	/// The two-level namespace, e.g. `env` in `env.double`.
	pub namespace: String,
	/// The name inside the namespace.
	pub name: String,
}

impl std::fmt::Display for ImportName {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> Result<(), std::fmt::Error> {
		write!( f, "{}.{}", self.namespace, self.name )
	}
}

/// Errors produced while resolving a module's imports.
#[derive( Debug, Error )]
pub enum LinkError {
	/// One or more declared imports had no value in the namespace object.
	/// Misses are collected across the whole import list before reporting.
	#[error( "Missing Imports: {}", joined( .0 ))] MissingImports( NEVec<ImportName> ),
	/// A function import resolved to a value that is not callable.
	#[error( "Not Callable: import {import} resolved to {found}" )] NotCallable { import: ImportName, found: &'static str },
	/// A 64-bit global import resolved to a plain Number.
	#[error( "Import {0} attempted to cast a Number to a BigInteger" )] NumberWhereBigInt( ImportName ),
	/// A non-64-bit global import resolved to a BigInteger.
	#[error( "Import {0} attempted to cast a BigInteger to a Number" )] BigIntWhereNumber( ImportName ),
	/// A global import resolved to something other than a numeric value.
	#[error( "Invalid value for global import {import}: found {found}" )] InvalidGlobalValue { import: ImportName, found: &'static str },
	/// A memory import resolved to something other than a memory wrapper.
	#[error( "Expected a memory wrapper for import {import}, found {found}" )] MemoryWrapperExpected { import: ImportName, found: &'static str },
	/// A table import resolved to something other than a table wrapper.
	#[error( "Expected a table wrapper for import {import}, found {found}" )] TableWrapperExpected { import: ImportName, found: &'static str },
	/// The module declares an import of a kind this embedding does not link.
	#[error( "Unsupported import kind for {0}" )] UnsupportedKind( ImportName ),
	/// Host functions with more than one result are not implemented.
	#[error( "Import {0} declares more than one result" )] MultiResultImport( ImportName ),
	/// Marshalling a global's initial value failed.
	#[error( "Import {import}: {source}" )] Marshal { import: ImportName, source: MarshalError },
	/// The guest store rejected the resolved imports at instantiation.
	#[error( "Incompatible Import: {0}" )] Incompatible( String ),
}

fn joined( names: &NEVec<ImportName> ) -> String {
	names.nonempty_iter().map(| name | name.to_string() ).into_iter().join( ", " )
}

/// The resolved addresses for every declared import, in declared order.
pub(crate) struct ResolvedImportSet {
	pub(crate) addresses: Vec<ExternAddr>,
}

/// Resolves every import declared by `module` against the namespace object.
///
/// With no resolver supplied, resolution succeeds only for a module that
/// declares zero imports; every declared import is reported missing.
pub(crate) fn resolve(
	store: &mut Store<GuestStore>,
	module: &Module,
	resolver: Option<&dyn ImportResolver>,
) -> Result<ResolvedImportSet, LinkError> {

	let mut missing: Vec<ImportName> = Vec::new();
	let mut addresses: Vec<ExternAddr> = Vec::with_capacity( module.imports().len() );

	for import in module.imports() {
		let name = ImportName {
			namespace: import.module().to_string(),
			name: import.name().to_string(),
		};

		let Some( value ) = resolver.and_then(| resolver | resolver.resolve( &name.namespace, &name.name )) else {
			debug!( import = %name, "import not found in namespace object" );
			missing.push( name );
			continue ;
		};
		debug!( import = %name, found = value.kind(), "resolving import" );

		let address = match import.ty() {
			ExternType::Func( signature ) => {
				let function = match value {
					Value::Function( function ) => function,
					other => return Err( LinkError::NotCallable { import: name, found: other.kind() }),
				};
				// A wrapper around a guest export is re-linked by its original
				// address, preserving reference identity across modules.
				let address = match function.export_address() {
					Some( address ) => address,
					None => bridge::bind_host_function( store, &function, &signature, &name )?,
				};
				ExternAddr::Func( address )
			}
			ExternType::Global( global_ty ) => {
				ExternAddr::Global( resolve_global( store, &name, &value, &global_ty )? )
			}
			ExternType::Memory( _ ) => match value {
				Value::Memory( memory ) => ExternAddr::Memory( memory.address() ),
				other => return Err( LinkError::MemoryWrapperExpected { import: name, found: other.kind() }),
			},
			ExternType::Table( _ ) => match value {
				Value::Table( table ) => ExternAddr::Table( table.address() ),
				other => return Err( LinkError::TableWrapperExpected { import: name, found: other.kind() }),
			},
			_ => return Err( LinkError::UnsupportedKind( name )),
		};
		addresses.push( address );
	}

	let mut missing = missing.into_iter();
	if let Some( first ) = missing.next() {
		let mut names = NEVec::new( first );
		for name in missing {
			names.push( name );
		}
		return Err( LinkError::MissingImports( names ));
	}
	Ok( ResolvedImportSet { addresses })

}

/// Allocates a fresh guest global under the declared type, initialized from a
/// host numeric value.
///
/// The value must match the declared type exactly: a 64-bit global accepts
/// only a BigInteger, every other numeric global accepts only a Number.
fn resolve_global(
	store: &mut Store<GuestStore>,
	import: &ImportName,
	value: &Value,
	global_ty: &GlobalType,
) -> Result<GlobalAddr, LinkError> {

	let content = global_ty.content().clone();
	let expects_i64 = matches!( content, ValType::I64 );
	match value {
		Value::Number( _ ) if expects_i64 => return Err( LinkError::NumberWhereBigInt( import.clone() )),
		Value::BigInt( _ ) if !expects_i64 => return Err( LinkError::BigIntWhereNumber( import.clone() )),
		Value::Number( _ ) | Value::BigInt( _ ) => {}
		other => return Err( LinkError::InvalidGlobalValue { import: import.clone(), found: other.kind() }),
	}

	let init = marshal::host_to_guest( store.data(), value, &content )
		.map_err(| source | LinkError::Marshal { import: import.clone(), source })?;
	let global = Global::new( &mut *store, GlobalType::new( content, global_ty.mutability() ), init )
		.map_err(| error | LinkError::Incompatible( error.to_string() ))?;
	Ok( store.data_mut().allocate_global( global ))

}
