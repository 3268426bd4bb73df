//! SQL expression builder: scalar escaping, condition compilation, and pure
//! statement builders for the Firebird dialect.

pub mod condition;
pub mod statement;
pub mod value;

pub use condition::{Field, Filter, Op, Term};
pub use statement::{
    DeleteOne, InsertMany, InsertOne, RowValues, SqlParam, Template, UpdateOne, UpdateOrInsert,
    paginate,
};
pub use value::Value;
