pub struct SampleLocation {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

pub struct DemoResources {
    /// Probe points for `insights` statistics
    pub locations: &'static [SampleLocation],
}

pub struct DemoConfig {
    pub resources: DemoResources,
}

pub const DEMO: DemoConfig = DemoConfig {
    resources: DemoResources {
        locations: &[
            SampleLocation {
                name: "San Francisco",
                latitude: 37.7749,
                longitude: -122.4194,
            },
            SampleLocation {
                name: "Oakland",
                latitude: 37.8044,
                longitude: -122.2712,
            },
            SampleLocation {
                name: "San Jose",
                latitude: 37.3382,
                longitude: -121.8863,
            },
        ],
    },
};
