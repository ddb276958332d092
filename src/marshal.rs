//! Value marshalling between host values and guest values.
//!
//! One value at a time, parameterized by the guest value type. Numeric kinds
//! never coerce across the 32/64-bit divide: the guest's i64 pairs with the
//! host's arbitrary-precision integer and nothing else, everything else
//! numeric pairs with the host's double. Reference kinds other than function
//! references are rejected in both directions.

use num_bigint::{ BigInt, Sign };
use thiserror::Error ;
use wasmtime::{ HeapType, Val, ValType };

use crate::host::Value ;
use crate::store::GuestStore ;



/// Errors produced when a value cannot be represented in the target type.
#[derive( Debug, Error )]
pub enum MarshalError {
	/// A Number was required (i32/f32/f64) and something else was found.
	#[error( "Expected a Number for a {expected} value, found {found}" )]
	NumberExpected { expected: &'static str, found: &'static str },
	/// The guest expects a 64-bit integer; only a BigInteger can carry one.
	#[error( "Expected a BigInteger for a 64-bit integer value, found {found}" )]
	BigIntExpected { found: &'static str },
	/// A function reference slot was given a value that is neither null nor callable.
	#[error( "Expected an exported function or null for a function reference, found {found}" )]
	FunctionExpected { found: &'static str },
	/// The function did not originate as an export known to this embedding.
	#[error( "Function reference does not correspond to any exported function" )]
	UnknownFunctionReference,
	/// Opaque external references are not implemented in either direction.
	#[error( "Unsupported reference kind: {0}" )] UnsupportedReference( &'static str ),
	/// A guest value type with no host representation.
	#[error( "Unsupported value kind: {0}" )] UnsupportedType( &'static str ),
}

/// Converts one host value into a guest value of the given type.
pub(crate) fn host_to_guest( guest: &GuestStore, value: &Value, ty: &ValType ) -> Result<Val, MarshalError> {
	match ty {
		ValType::I32 => match value {
			Value::Number( number ) => Ok( Val::I32( wrap_to_i32( *number ))),
			other => Err( MarshalError::NumberExpected { expected: "32-bit integer", found: other.kind() }),
		},
		ValType::I64 => match value {
			Value::BigInt( integer ) => Ok( Val::I64( reduce_to_i64( integer ))),
			other => Err( MarshalError::BigIntExpected { found: other.kind() }),
		},
		ValType::F32 => match value {
			Value::Number( number ) => Ok( Val::F32(( *number as f32 ).to_bits() )),
			other => Err( MarshalError::NumberExpected { expected: "32-bit float", found: other.kind() }),
		},
		ValType::F64 => match value {
			Value::Number( number ) => Ok( Val::F64( number.to_bits() )),
			other => Err( MarshalError::NumberExpected { expected: "64-bit float", found: other.kind() }),
		},
		ValType::V128 => Err( MarshalError::UnsupportedType( "v128" )),
		ValType::Ref( reference ) => match reference.heap_type() {
			HeapType::Func => match value {
				Value::Null => Ok( Val::FuncRef( None )),
				Value::Function( function ) => match function.export_address() {
					Some( address ) => Ok( Val::FuncRef( Some( guest.func( address )))),
					None => Err( MarshalError::UnknownFunctionReference ),
				},
				other => Err( MarshalError::FunctionExpected { found: other.kind() }),
			},
			HeapType::Extern => Err( MarshalError::UnsupportedReference( "externref" )),
			_ => Err( MarshalError::UnsupportedReference( "non-function reference" )),
		},
	}
}

/// Converts one guest value into its host representation.
pub(crate) fn guest_to_host( value: &Val ) -> Result<Value, MarshalError> {
	match value {
		Val::I32( value ) => Ok( Value::Number( f64::from( *value ))),
		Val::I64( value ) => Ok( Value::BigInt( BigInt::from( *value ))),
		Val::F32( bits ) => Ok( Value::Number( f64::from( f32::from_bits( *bits )))),
		Val::F64( bits ) => Ok( Value::Number( f64::from_bits( *bits ))),
		Val::FuncRef( None ) => Ok( Value::Null ),
		// The guest store assigns addresses at the export surface; a reference
		// minted inside guest code never crossed it and cannot be correlated
		// with a cached wrapper.
		Val::FuncRef( Some( _ )) => Err( MarshalError::UnknownFunctionReference ),
		Val::ExternRef( _ ) => Err( MarshalError::UnsupportedReference( "externref" )),
		Val::V128( _ ) => Err( MarshalError::UnsupportedType( "v128" )),
		_ => Err( MarshalError::UnsupportedReference( "non-function reference" )),
	}
}

/// The host engine's integer-conversion rule for 32-bit slots: truncate toward
/// zero, then wrap modulo 2^32. Non-finite numbers become 0.
fn wrap_to_i32( number: f64 ) -> i32 {
	if !number.is_finite() {
		return 0 ;
	}
	let wrapped = number.trunc().rem_euclid( 4_294_967_296.0 );
	wrapped as u32 as i32
}

/// Reduces a host big integer modulo 2^64 and reinterprets the low bits with
/// the big integer's sign applied.
fn reduce_to_i64( value: &BigInt ) -> i64 {
	let ( sign, magnitude ) = value.clone().into_parts();
	let low = magnitude.iter_u64_digits().next().unwrap_or( 0 );
	match sign {
		Sign::Minus => ( low as i64 ).wrapping_neg(),
		Sign::NoSign | Sign::Plus => low as i64,
	}
}
