use wasm_embed::{ BigInt, Value };

use crate::fixtures ;

#[test]
fn global_exports_surface_as_their_marshalled_current_value() {

	let mut embedder = fixtures::embedder();
	let instance = fixtures::instantiate( &mut embedder, fixtures::GLOBAL_EXPORTS );

	assert_eq!( embedder.export_names( instance ), vec![ "answer", "big" ] );

	match embedder.export( instance, "answer" ) {
		Ok( Value::Number( value )) => assert_eq!( value, 42.0 ),
		value => panic!( "Expected Ok( Number( 42.0 )), found: {:#?}", value ),
	}
	match embedder.export( instance, "big" ) {
		Ok( Value::BigInt( value )) => assert_eq!( value, BigInt::from( -7 )),
		value => panic!( "Expected Ok( BigInt( -7 )), found: {:#?}", value ),
	}

	// An unknown name is a host-visible error, not a panic.
	assert!( embedder.export( instance, "missing" ).is_err() );

}
