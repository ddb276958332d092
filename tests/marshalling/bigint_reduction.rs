use wasm_embed::{ BigInt, Value };

use crate::fixtures ;

/// Host big integers wider than 64 bits reduce modulo 2^64, with the sign
/// applied from the big integer itself.
#[test]
fn oversized_big_integers_reduce_modulo_two_to_the_64() {

	let mut embedder = fixtures::embedder();
	let instance = fixtures::instantiate( &mut embedder, fixtures::ECHO );
	let echo = embedder.export( instance, "echo-i64" ).expect( "Failed to look up export" );

	let two_64 = BigInt::from( 1_u128 << 64 );

	match embedder.call( &echo, &[ Value::BigInt( two_64.clone() + BigInt::from( 5 ))]) {
		Ok( Value::BigInt( result )) => assert_eq!( result, BigInt::from( 5 )),
		result => panic!( "Expected Ok( BigInt( 5 )), found: {:#?}", result ),
	}

	match embedder.call( &echo, &[ Value::BigInt( -( two_64 + BigInt::from( 5 )))]) {
		Ok( Value::BigInt( result )) => assert_eq!( result, BigInt::from( -5 )),
		result => panic!( "Expected Ok( BigInt( -5 )), found: {:#?}", result ),
	}

}
