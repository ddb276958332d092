use wasm_embed::{ FunctionRef, Imports, Value };

use crate::fixtures ;

#[test]
fn absence_at_either_lookup_level_is_a_missing_import() {

	let mut embedder = fixtures::embedder();
	let module = fixtures::compile( &mut embedder, fixtures::ONE_MISSING );
	let noop = || FunctionRef::native( "noop", | _scope, _arguments | Ok( Value::Undefined ));

	// The `env` namespace itself is absent.
	let imports = Imports::new().define( "other", "foo", Value::Function( noop() ));
	let error = embedder.instantiate( module, Some( &imports )).into_result()
		.expect_err( "a missing namespace level must fail the link" );
	assert!( error.to_string().contains( "env.foo" ), "unexpected message: {}", error );

	// The namespace exists but lacks the name.
	let imports = Imports::new().define( "env", "bar", Value::Function( noop() ));
	let error = embedder.instantiate( module, Some( &imports )).into_result()
		.expect_err( "a missing name must fail the link" );
	assert!( error.to_string().contains( "env.foo" ), "unexpected message: {}", error );

	// Supplying the import resolves it.
	let imports = Imports::new().define( "env", "foo", Value::Function( noop() ));
	embedder.instantiate( module, Some( &imports )).into_result()
		.expect( "Failed to instantiate with a satisfied import" );

}
