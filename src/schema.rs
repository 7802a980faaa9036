table! {
    comics (id) {
        id -> Integer,
        name -> Text,
        thumbnail -> Text,
        category -> Text,
        tag -> Text,
        artist -> Text,
        state -> Text,
        created -> Timestamp,
        updated -> Timestamp,
        #[sql_name = "userRating"]
        user_rating -> Nullable<Double>,
    }
}

table! {
    pages (comic_name, page_number) {
        comic_name -> Text,
        page_number -> Integer,
        page_url -> Text,
    }
}

table! {
    keywords (comic_id, keyword) {
        comic_id -> Integer,
        keyword -> Text,
    }
}

joinable!(keywords -> comics (comic_id));

allow_tables_to_appear_in_same_query!(
    comics,
    keywords,
    pages,
);
