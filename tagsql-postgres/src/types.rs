//! Binding [`SqlValue`]s to PostgreSQL parameters.
//!
//! Values are converted against the parameter types the server reported when
//! the statement was prepared, so a `NULL` or an empty list gets the column's
//! own type instead of a guess. Lists bind to array parameters and must be
//! homogeneous; `NULL` elements are allowed.

use std::mem;

use chrono::{DateTime, NaiveDateTime, Utc};
use postgres_types::{Kind, ToSql, Type};
use tagsql_query::SqlValue;
use uuid::Uuid;

use crate::error::{PgError, PgResult};

/// A boxed parameter ready for binding.
pub type Param = Box<dyn ToSql + Sync + Send>;

/// Convert every value for the prepared parameter types.
pub fn bind_params(values: &[SqlValue], types: &[Type]) -> PgResult<Vec<Param>> {
    if values.len() != types.len() {
        return Err(PgError::type_conversion(format!(
            "statement expects {} parameters, got {}",
            types.len(),
            values.len()
        )));
    }
    values
        .iter()
        .zip(types)
        .enumerate()
        .map(|(i, (value, ty))| {
            to_param(value, ty).map_err(|e| match e {
                PgError::TypeConversion(msg) => {
                    PgError::type_conversion(format!("parameter ${}: {}", i + 1, msg))
                }
                other => other,
            })
        })
        .collect()
}

/// Borrow boxed parameters in the form `tokio-postgres` takes them.
pub fn param_refs(params: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)).collect()
}

/// Dispatch on a scalar PostgreSQL type to a generic binder.
macro_rules! by_type {
    ($ty:expr, $bind:ident, $value:expr) => {
        match *$ty {
            Type::BOOL => $bind::<bool>($value, to_bool),
            Type::INT2 => $bind::<i16>($value, to_i16),
            Type::INT4 => $bind::<i32>($value, to_i32),
            Type::INT8 => $bind::<i64>($value, to_i64),
            Type::FLOAT4 => $bind::<f32>($value, to_f32),
            Type::FLOAT8 => $bind::<f64>($value, to_f64),
            Type::UUID => $bind::<Uuid>($value, to_uuid),
            Type::TIMESTAMPTZ => $bind::<DateTime<Utc>>($value, to_timestamptz),
            Type::TIMESTAMP => $bind::<NaiveDateTime>($value, to_timestamp),
            Type::JSON | Type::JSONB => $bind::<serde_json::Value>($value, to_json),
            _ => $bind::<String>($value, to_text),
        }
    };
}

/// Convert one value for a parameter of type `ty`.
pub fn to_param(value: &SqlValue, ty: &Type) -> PgResult<Param> {
    match (ty.kind(), value) {
        (Kind::Array(member), SqlValue::List(items)) => {
            check_homogeneous(items)?;
            by_type!(member, array, items)
        }
        (Kind::Array(member), SqlValue::Null) => by_type!(member, null_array, value),
        (Kind::Array(_), other) => Err(mismatch(other, ty.name())),
        (_, SqlValue::List(_)) if !is_json(ty) => Err(PgError::type_conversion(format!(
            "list bound to non-array parameter of type {}",
            ty.name()
        ))),
        _ => by_type!(ty, scalar, value),
    }
}

fn is_json(ty: &Type) -> bool {
    *ty == Type::JSON || *ty == Type::JSONB
}

type Convert<T> = fn(&SqlValue) -> PgResult<T>;

fn scalar<T: ToSql + Sync + Send + 'static>(value: &SqlValue, convert: Convert<T>) -> PgResult<Param> {
    let bound: Option<T> = if value.is_null() {
        None
    } else {
        Some(convert(value)?)
    };
    Ok(Box::new(bound))
}

fn array<T: ToSql + Sync + Send + 'static>(items: &[SqlValue], convert: Convert<T>) -> PgResult<Param> {
    let bound = items
        .iter()
        .map(|item| if item.is_null() { Ok(None) } else { convert(item).map(Some) })
        .collect::<PgResult<Vec<Option<T>>>>()?;
    Ok(Box::new(bound))
}

fn null_array<T: ToSql + Sync + Send + 'static>(_: &SqlValue, _: Convert<T>) -> PgResult<Param> {
    Ok(Box::new(None::<Vec<Option<T>>>))
}

/// Every non-null element must be the same kind of scalar.
fn check_homogeneous(items: &[SqlValue]) -> PgResult<()> {
    let mut first: Option<&SqlValue> = None;
    for item in items.iter().filter(|v| !v.is_null()) {
        if let SqlValue::List(_) = item {
            return Err(PgError::type_conversion("nested lists cannot be bound as an array"));
        }
        match first {
            None => first = Some(item),
            Some(f) if mem::discriminant(f) != mem::discriminant(item) => {
                return Err(PgError::type_conversion(format!(
                    "mixed list of {} and {}",
                    f.type_name(),
                    item.type_name()
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn mismatch(value: &SqlValue, target: &str) -> PgError {
    PgError::type_conversion(format!("cannot bind {} as {}", value.type_name(), target))
}

fn to_bool(value: &SqlValue) -> PgResult<bool> {
    match value {
        SqlValue::Bool(b) => Ok(*b),
        other => Err(mismatch(other, "boolean")),
    }
}

fn to_i64(value: &SqlValue) -> PgResult<i64> {
    match value {
        SqlValue::Int(i) => Ok(*i),
        other => Err(mismatch(other, "bigint")),
    }
}

fn to_i32(value: &SqlValue) -> PgResult<i32> {
    let i = to_i64(value)?;
    i32::try_from(i).map_err(|_| PgError::type_conversion(format!("{} out of range for integer", i)))
}

fn to_i16(value: &SqlValue) -> PgResult<i16> {
    let i = to_i64(value)?;
    i16::try_from(i).map_err(|_| PgError::type_conversion(format!("{} out of range for smallint", i)))
}

fn to_f64(value: &SqlValue) -> PgResult<f64> {
    match value {
        SqlValue::Float(f) => Ok(*f),
        SqlValue::Int(i) => Ok(*i as f64),
        other => Err(mismatch(other, "double precision")),
    }
}

fn to_f32(value: &SqlValue) -> PgResult<f32> {
    to_f64(value).map(|f| f as f32)
}

fn to_uuid(value: &SqlValue) -> PgResult<Uuid> {
    match value {
        SqlValue::Uuid(u) => Ok(*u),
        SqlValue::String(s) => {
            Uuid::parse_str(s).map_err(|e| PgError::type_conversion(format!("invalid uuid: {}", e)))
        }
        other => Err(mismatch(other, "uuid")),
    }
}

fn to_timestamptz(value: &SqlValue) -> PgResult<DateTime<Utc>> {
    match value {
        SqlValue::Timestamp(t) => Ok(*t),
        SqlValue::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| PgError::type_conversion(format!("invalid timestamp: {}", e))),
        other => Err(mismatch(other, "timestamptz")),
    }
}

fn to_timestamp(value: &SqlValue) -> PgResult<NaiveDateTime> {
    to_timestamptz(value).map(|t| t.naive_utc())
}

fn to_json(value: &SqlValue) -> PgResult<serde_json::Value> {
    match value {
        SqlValue::Json(j) => Ok(j.clone()),
        other => serde_json::to_value(other)
            .map_err(|e| PgError::type_conversion(format!("cannot encode json: {}", e))),
    }
}

fn to_text(value: &SqlValue) -> PgResult<String> {
    match value {
        SqlValue::String(s) => Ok(s.clone()),
        SqlValue::Uuid(u) => Ok(u.to_string()),
        other => Err(mismatch(other, "text")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert!(to_param(&SqlValue::Int(42), &Type::INT8).is_ok());
        assert!(to_param(&SqlValue::Int(42), &Type::INT4).is_ok());
        assert!(to_param(&SqlValue::String("x".into()), &Type::TEXT).is_ok());
        assert!(to_param(&SqlValue::Bool(true), &Type::BOOL).is_ok());
        assert!(to_param(&SqlValue::Null, &Type::UUID).is_ok());
    }

    #[test]
    fn test_string_into_uuid_and_timestamp() {
        let id = SqlValue::String("67e55044-10b1-426f-9247-bb680e5fe0c8".into());
        assert!(to_param(&id, &Type::UUID).is_ok());

        let bad = SqlValue::String("not-a-uuid".into());
        assert!(matches!(
            to_param(&bad, &Type::UUID),
            Err(PgError::TypeConversion(_))
        ));

        let ts = SqlValue::String("2026-03-01T10:00:00Z".into());
        assert!(to_param(&ts, &Type::TIMESTAMPTZ).is_ok());
        assert!(to_param(&ts, &Type::TIMESTAMP).is_ok());
    }

    #[test]
    fn test_integer_range() {
        assert!(to_param(&SqlValue::Int(i64::MAX), &Type::INT4).is_err());
        assert!(to_param(&SqlValue::Int(40_000), &Type::INT2).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let err = to_param(&SqlValue::Bool(true), &Type::INT8).err().unwrap();
        assert_eq!(err.to_string(), "type conversion error: cannot bind bool as bigint");
    }

    #[test]
    fn test_homogeneous_lists() {
        let ids = SqlValue::List(vec![SqlValue::Int(1), SqlValue::Null, SqlValue::Int(3)]);
        assert!(to_param(&ids, &Type::INT8_ARRAY).is_ok());

        let empty = SqlValue::List(Vec::new());
        assert!(to_param(&empty, &Type::UUID_ARRAY).is_ok());
        assert!(to_param(&SqlValue::Null, &Type::TEXT_ARRAY).is_ok());
    }

    #[test]
    fn test_mixed_list_rejected() {
        let mixed = SqlValue::List(vec![SqlValue::Int(1), SqlValue::String("2".into())]);
        let err = to_param(&mixed, &Type::INT8_ARRAY).err().unwrap();
        assert!(err.to_string().contains("mixed list of int and string"));

        let nested = SqlValue::List(vec![SqlValue::List(vec![SqlValue::Int(1)])]);
        assert!(to_param(&nested, &Type::INT8_ARRAY).is_err());
    }

    #[test]
    fn test_list_shapes() {
        let list = SqlValue::List(vec![SqlValue::Int(1)]);
        assert!(to_param(&list, &Type::INT8).is_err());
        assert!(to_param(&list, &Type::JSONB).is_ok());
        assert!(to_param(&SqlValue::Int(1), &Type::INT8_ARRAY).is_err());
    }

    #[test]
    fn test_bind_params_arity() {
        let err = bind_params(&[SqlValue::Int(1)], &[Type::INT8, Type::TEXT])
            .err()
            .unwrap();
        assert!(err.to_string().contains("expects 2 parameters, got 1"));

        let err = bind_params(&[SqlValue::Int(1), SqlValue::Int(2)], &[Type::INT8, Type::TEXT])
            .err()
            .unwrap();
        assert!(err.to_string().contains("parameter $2"));

        let params = bind_params(
            &[SqlValue::Int(1), SqlValue::String("a".into())],
            &[Type::INT8, Type::TEXT],
        )
        .unwrap();
        assert_eq!(param_refs(&params).len(), 2);
    }
}
