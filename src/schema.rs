diesel::table! {
    products (id) {
        id -> Integer,
        source -> Text,
        url -> Text,
        name -> Text,
        description -> Text,
        price -> Nullable<Double>,
        image_url -> Nullable<Text>,
        name_emb -> Nullable<Binary>,
        descr_emb -> Nullable<Binary>,
        updated_at -> Timestamp,
    }
}
