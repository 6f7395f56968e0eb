pub mod catalog;
pub mod events;
pub mod health;
pub mod leaderboard;
pub mod practitioners;
