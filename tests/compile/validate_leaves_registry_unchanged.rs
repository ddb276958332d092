use crate::fixtures ;

#[test]
fn validate_reports_the_verdict_without_growing_the_registry() {

	let mut embedder = fixtures::embedder();
	fixtures::compile( &mut embedder, fixtures::ADD );
	assert_eq!( embedder.module_count(), 1 );

	match embedder.validate( fixtures::ADD.as_bytes() ).into_result() {
		Ok( true ) => {}
		value => panic!( "Expected Ok( true ), found: {:#?}", value ),
	}
	assert_eq!( embedder.module_count(), 1, "a successful validate must discard its module" );

	match embedder.validate( b"garbage" ).into_result() {
		Ok( false ) => {}
		value => panic!( "Expected Ok( false ), found: {:#?}", value ),
	}
	assert_eq!( embedder.module_count(), 1 );

}
