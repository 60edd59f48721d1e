pub mod metrics_route;
