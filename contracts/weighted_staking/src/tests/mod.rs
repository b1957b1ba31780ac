mod rewards;
mod setup;
