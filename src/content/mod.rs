mod codec;
mod post;
mod slug;

pub use self::{
    codec::{
        MARKDOWN_EXT, UNKNOWN_AUTHOR, decode, decode_at, encode, excerpt, file_id,
        format_timestamp,
    },
    post::{DecodedPost, Post, PostForm},
    slug::slugify,
};
