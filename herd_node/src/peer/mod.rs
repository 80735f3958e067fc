pub mod neighbor_link;
