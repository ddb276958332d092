use wasm_embed::{ FunctionRef, Value };

use crate::fixtures ;

#[test]
fn fetching_the_same_export_twice_yields_the_same_wrapper_object() {

	let mut embedder = fixtures::embedder();
	let instance = fixtures::instantiate( &mut embedder, fixtures::ECHO );

	let first = embedder.export( instance, "echo-i32" ).expect( "Failed to look up export" );
	let second = embedder.export( instance, "echo-i32" ).expect( "Failed to look up export" );

	match ( &first, &second ) {
		( Value::Function( a ), Value::Function( b )) => {
			assert!( FunctionRef::ptr_eq( a, b ), "repeated lookups must observe one identity" );
		}
		values => panic!( "Expected two Function wrappers, found: {:#?}", values ),
	}
	assert_eq!( first, second );

	// Distinct exports are distinct objects.
	let other = embedder.export( instance, "echo-i64" ).expect( "Failed to look up export" );
	assert_ne!( first, other );

}

#[test]
fn identity_restarts_once_every_host_reference_is_dropped() {

	let mut embedder = fixtures::embedder();
	let instance = fixtures::instantiate( &mut embedder, fixtures::ECHO );

	let first = embedder.export( instance, "echo-i32" ).expect( "Failed to look up export" );
	drop( first );

	// The cache holds only weak references; with no host root left, the next
	// lookup mints a fresh wrapper rather than resurrecting a dead one.
	let second = embedder.export( instance, "echo-i32" ).expect( "Failed to look up export" );
	let third = embedder.export( instance, "echo-i32" ).expect( "Failed to look up export" );
	assert_eq!( second, third );

}
