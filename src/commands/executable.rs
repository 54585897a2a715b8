use crate::response::Response;
use crate::store::Store;

pub trait Executable {
    fn exec(self, store: Store) -> Response;
}
