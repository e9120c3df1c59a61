//! Names of the relations and procedures the store contract relies on.
//!
//! The physical schema is provisioned outside this workspace. These
//! constants are the only place the service spells its names.

/// Tables and views read directly.
pub mod table {
    /// Catalog entries.
    pub const GAME: &str = "game";

    /// User accounts. Quoted because `user` is reserved in PostgreSQL.
    pub const USER: &str = "\"user\"";

    /// Purchase records.
    pub const PURCHASES: &str = "purchases";

    /// Union of every facet table as `(facet_kind, facet_id, facet_name)`.
    pub const FACET_VOCABULARY: &str = "facet_vocabulary";
}

/// Stored functions called by the service.
pub mod proc {
    /// `(genres, categories, tags, langs, audio_langs, developers, publishers
    /// TEXT, lim BIGINT, off BIGINT) RETURNS SETOF game`.
    ///
    /// The procedure must order matches by `game_id` before applying
    /// `LIMIT`/`OFFSET`. The caller's outer `ORDER BY` only sorts the page
    /// it gets back, so paging is reproducible only if the inner order is.
    pub const FILTER_GAMES: &str = "sp_filter_games";

    /// `(game_id BIGINT)` returning the game row plus eight comma-joined lists.
    pub const GET_GAME_INFO: &str = "sp_get_game_info";

    /// `(user_id BIGINT, game_id BIGINT) RETURNS INTEGER`, the number of matching purchases.
    pub const HAS_PURCHASED: &str = "has_purchased";

    /// `(username TEXT, password_hash TEXT, salt TEXT, role TEXT)` returning the new user row.
    pub const ADD_USER: &str = "sp_add_user";

    /// `(user_id BIGINT, password_hash TEXT, salt TEXT) RETURNS BOOLEAN` (false when missing).
    pub const CHANGE_PASSWORD: &str = "sp_change_password";

    /// `(username TEXT, role TEXT) RETURNS BOOLEAN` (false when missing).
    pub const CHANGE_ROLE: &str = "sp_change_role";

    /// `(username TEXT) RETURNS BOOLEAN` (false when missing).
    pub const DELETE_USER: &str = "sp_delete_user";

    /// `(user_id BIGINT, game_id BIGINT)` returning the new purchase row.
    pub const MAKE_PURCHASE: &str = "sp_make_purchase";
}

/// SQLSTATE codes the procedures raise.
pub mod sqlstate {
    /// `unique_violation`: username already taken.
    pub const UNIQUE_VIOLATION: &str = "23505";

    /// `no_data_found`: the acting account does not exist.
    pub const NO_DATA_FOUND: &str = "P0002";

    /// `raise_exception`: the procedure refused the operation.
    pub const RAISE_EXCEPTION: &str = "P0001";
}

/// Column list of a catalog entry row, in contract order.
pub const GAME_COLUMNS: &str = "game_id, game_name, release_date, estimated_owners, \
     price_cents, about_game, metacritic_score, platform_support, header_image";

/// Column list of an account row.
pub const USER_COLUMNS: &str =
    "user_id, username, balance_cents, password_hash, salt, user_role, date_joined";
