use wasm_embed::{ HostException, Imports, InstantiationError, LinkError, Value };

use crate::fixtures ;

#[test]
fn a_memory_import_requires_a_memory_wrapper() {

	let mut embedder = fixtures::embedder();
	let module = fixtures::compile( &mut embedder, fixtures::MEMORY_IMPORT );

	let imports = Imports::new().define( "env", "mem", Value::Number( 1.0 ));
	match embedder.instantiate( module, Some( &imports )).into_result() {
		Err( HostException::Instantiation( InstantiationError::Link( LinkError::MemoryWrapperExpected { .. }))) => {}
		value => panic!( "Expected Err( MemoryWrapperExpected ), found: {:#?}", value ),
	}

}

#[test]
fn a_table_import_requires_a_table_wrapper() {

	let mut embedder = fixtures::embedder();
	let module = fixtures::compile( &mut embedder, fixtures::TABLE_IMPORT );

	let imports = Imports::new().define( "env", "t", Value::Null );
	match embedder.instantiate( module, Some( &imports )).into_result() {
		Err( HostException::Instantiation( InstantiationError::Link( LinkError::TableWrapperExpected { .. }))) => {}
		value => panic!( "Expected Err( TableWrapperExpected ), found: {:#?}", value ),
	}

}
