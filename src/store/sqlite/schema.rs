//! Diesel table definitions for the SQLite-backed stores.

diesel::table! {
    canonical_mappings (canonical_id) {
        canonical_id -> Text,
        title -> Text,
        venue_a_market_id -> Nullable<Text>,
        venue_b_market_id -> Nullable<Text>,
        similarity_score -> Double,
        confidence -> Text,
    }
}

diesel::table! {
    opportunities (id) {
        id -> Text,
        canonical_id -> Text,
        chosen_leg -> Text,
        combined_cost -> Text,
        venue_a_price -> Text,
        venue_b_price -> Text,
        venue_a_depth -> Text,
        venue_b_depth -> Text,
        recommended_size -> Text,
        estimated_fees -> Text,
        net_profit -> Text,
        detected_at -> Text,
        status -> Text,
        expires_at -> Nullable<Text>,
    }
}

diesel::table! {
    trades (id) {
        id -> Text,
        opportunity_id -> Nullable<Text>,
        venue -> Text,
        venue_market_id -> Text,
        side -> Text,
        amount -> Text,
        price -> Text,
        order_id -> Nullable<Text>,
        status -> Text,
        executed_at -> Nullable<Text>,
        error_message -> Nullable<Text>,
    }
}

diesel::joinable!(opportunities -> canonical_mappings (canonical_id));
diesel::joinable!(trades -> opportunities (opportunity_id));

diesel::allow_tables_to_appear_in_same_query!(canonical_mappings, opportunities, trades,);
