pub mod threaded_capture_session;
