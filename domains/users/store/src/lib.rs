//! The CRUD contract every user store satisfies, whether it talks to
//! PostgreSQL directly or fronts another store with a cache.

use database_traits::GenericDao;
use user_errors::UserError;
use user_models::{User, UserPayload};

mod validation;

pub use validation::validate_user;

pub trait UserStore:
    GenericDao<
        Model = User,
        CreateRequest = UserPayload,
        UpdateRequest = UserPayload,
        Error = UserError,
        ID = i64,
    >
{
}

impl<T> UserStore for T where
    T: GenericDao<
            Model = User,
            CreateRequest = UserPayload,
            UpdateRequest = UserPayload,
            Error = UserError,
            ID = i64,
        > + ?Sized
{
}
