pub mod dijkstra;

pub use dijkstra::{PathCache, ShortestPaths, calculate_shortest_paths};
