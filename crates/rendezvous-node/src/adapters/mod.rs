//! Host-side implementations of the rendezvous outbound ports.

pub mod presenter;

pub use presenter::LoggingPresenter;
