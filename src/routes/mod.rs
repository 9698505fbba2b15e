mod health_check;
mod users;

pub use health_check::health_check;
pub use users::{get_current_user, login, logout, refresh, signup};
