use wasm_embed::{ HostException, InstantiationError };

use crate::fixtures ;

#[test]
fn a_trapping_start_function_fails_instantiation_and_registers_nothing() {

	let mut embedder = fixtures::embedder();
	let module = fixtures::compile( &mut embedder, fixtures::START_TRAP );

	match embedder.instantiate( module, None ).into_result() {
		Err( HostException::Instantiation( InstantiationError::Trap( trap ))) => {
			assert!( trap.reason().contains( "unreachable" ), "unexpected reason: {}", trap.reason() );
		}
		value => panic!( "Expected Err( Instantiation( Trap )), found: {:#?}", value ),
	}

	// Failed is terminal: no partial instance may survive the attempt.
	assert_eq!( embedder.instance_count(), 0 );

	// The failure does not poison the embedder for later instantiations.
	let module = fixtures::compile( &mut embedder, fixtures::ADD );
	embedder.instantiate( module, None ).into_result().expect( "Failed to instantiate after a trap" );
	assert_eq!( embedder.instance_count(), 1 );

}
