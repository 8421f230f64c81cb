pub mod shared {
    pub mod capture_settings;
    pub mod constants;
    pub mod frame;
    pub mod rect;
}

pub mod detection {
    pub mod domain {
        pub mod eye_openness;
        pub mod face_metrics;
        pub mod landmark_detector;
        pub mod metrics_extractor;
        pub mod viewfinder;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod domain {
        pub mod capture_evaluator;
        pub mod capture_session;
        pub mod evaluator_state;
        pub mod guidance_state;
        pub mod photo_capturer;
        pub mod session_config;
        pub mod target_region;
    }
    pub mod infrastructure;
    pub mod session_logger;
}
