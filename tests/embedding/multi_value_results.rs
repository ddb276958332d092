use wasm_embed::Value ;

use crate::fixtures ;

#[test]
fn multiple_guest_results_come_back_as_a_host_array() {

	let mut embedder = fixtures::embedder();
	let instance = fixtures::instantiate( &mut embedder, fixtures::PAIR );
	let pair = embedder.export( instance, "pair" ).expect( "Failed to look up export" );

	match embedder.call( &pair, &[] ) {
		Ok( value ) => assert_eq!( value, Value::Array( vec![ Value::Number( 1.0 ), Value::Number( 2.0 )])),
		value => panic!( "Expected Ok( Array ), found: {:#?}", value ),
	}

}
