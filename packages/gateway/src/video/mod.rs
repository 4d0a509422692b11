mod operation;

pub use operation::VideoOperationStore;
