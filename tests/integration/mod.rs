mod support;

mod engine_sync;
mod filter_view;
