//! Illustration lookup for predicted crops

const DEFAULT_IMAGE: &str =
    "https://images.unsplash.com/photo-1500937386664-56d1dfef3854?q=80&w=1000&auto=format&fit=crop";

/// Known crops, keyed by lower-case name without whitespace
const CROP_IMAGES: &[(&str, &str)] = &[
    ("rice", "https://images.unsplash.com/photo-1586201375761-83865001e31c?q=80&w=1000&auto=format&fit=crop"),
    ("maize", "https://images.unsplash.com/photo-1551754655-cd27e38d2076?q=80&w=1000&auto=format&fit=crop"),
    ("chickpea", "https://images.unsplash.com/photo-1515543904379-3d757afe72e3?q=80&w=1000&auto=format&fit=crop"),
    ("kidneybeans", "https://images.unsplash.com/photo-1542442750-79a95221081f?q=80&w=1000&auto=format&fit=crop"),
    ("pigeonpeas", "https://images.unsplash.com/photo-1599579086776-857508977178?q=80&w=1000&auto=format&fit=crop"),
    ("mothbeans", "https://images.unsplash.com/photo-1591465001581-d4220715e7b6?q=80&w=1000&auto=format&fit=crop"),
    ("mungbean", "https://images.unsplash.com/photo-1626074216672-46337852f864?q=80&w=1000&auto=format&fit=crop"),
    ("blackgram", "https://images.unsplash.com/photo-1515543904379-3d757afe72e3?q=80&w=1000&auto=format&fit=crop"),
    ("lentil", "https://images.unsplash.com/photo-1515543904379-3d757afe72e3?q=80&w=1000&auto=format&fit=crop"),
    ("pomegranate", "https://images.unsplash.com/photo-1615485290382-441e4d049cb5?q=80&w=1000&auto=format&fit=crop"),
    ("banana", "https://images.unsplash.com/photo-1571771894821-ce9b6c11b08e?q=80&w=1000&auto=format&fit=crop"),
    ("mango", "https://images.unsplash.com/photo-1553279768-865429fa0078?q=80&w=1000&auto=format&fit=crop"),
    ("grapes", "https://images.unsplash.com/photo-1537640538965-1756fb179c26?q=80&w=1000&auto=format&fit=crop"),
    ("watermelon", "https://images.unsplash.com/photo-1587049352846-4a222e784d38?q=80&w=1000&auto=format&fit=crop"),
    ("muskmelon", "https://images.unsplash.com/photo-1598025362874-49480f0448c4?q=80&w=1000&auto=format&fit=crop"),
    ("apple", "https://images.unsplash.com/photo-1560806887-1e4cd0b6cbd6?q=80&w=1000&auto=format&fit=crop"),
    ("orange", "https://images.unsplash.com/photo-1611080626919-7cf5a9dbab5b?q=80&w=1000&auto=format&fit=crop"),
    ("papaya", "https://images.unsplash.com/photo-1617112848923-cc94e0b96984?q=80&w=1000&auto=format&fit=crop"),
    ("coconut", "https://images.unsplash.com/photo-1544376798-89aa6b82c6cd?q=80&w=1000&auto=format&fit=crop"),
    ("cotton", "https://images.unsplash.com/photo-1594300963363-228784d9f676?q=80&w=1000&auto=format&fit=crop"),
    ("jute", "https://images.unsplash.com/photo-1599629964232-28c0353846c9?q=80&w=1000&auto=format&fit=crop"),
    ("coffee", "https://images.unsplash.com/photo-1559056199-641a0ac8b55e?q=80&w=1000&auto=format&fit=crop"),
];

/// Image URL for `crop`, or a generic field image for unknown crops
pub fn image_url_for(crop: &str) -> &'static str {
    let key: String = crop
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    CROP_IMAGES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, url)| *url)
        .unwrap_or(DEFAULT_IMAGE)
}
