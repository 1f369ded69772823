// Static English word tables used by the heuristics in `analysis.rs` and by
// the fitness metrics in `gutenku_engine`.
//
// Every table is a sorted `&[&str]` of lower-case words so lookups are a
// binary search (see `contains`). The `tables_are_sorted` test guards the
// ordering; keep new entries in alphabetical order.

/// Coordinating conjunctions dropped from Markov transition sequences.
pub const FANBOYS: &[&str] = &["and", "but", "for", "nor", "or", "so", "yet"];

/// Short function words that may repeat across verses without penalty.
pub const ALLOWED_REPEATS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "is", "of", "on", "the", "to", "was",
    "with",
];

/// Honorifics skipped when looking for proper nouns.
pub const TITLES: &[&str] = &["dr", "lady", "lord", "miss", "mr", "mrs", "ms", "prof", "rev", "sir"];

/// Abbreviations whose trailing dot is removed before sentence segmentation.
pub const ABBREVIATIONS: &[&str] = &["Dr", "Mr", "Mrs", "St"];

/// Words the vowel-group heuristic miscounts, with their true syllable count.
pub const SYLLABLE_EXCEPTIONS: &[(&str, u32)] = &[
    ("being", 2),
    ("business", 2),
    ("create", 2),
    ("evening", 2),
    ("every", 2),
    ("fire", 1),
    ("hour", 1),
    ("idea", 3),
    ("lion", 2),
    ("people", 2),
    ("poem", 2),
    ("poet", 2),
    ("quiet", 2),
    ("science", 2),
    ("someone", 2),
    ("something", 2),
    ("sometimes", 2),
    ("wednesday", 2),
    ("whatever", 3),
];

/// Seasonal and natural-world vocabulary (kigo-inspired).
pub const NATURE_WORDS: &[&str] = &[
    "air", "autumn", "bamboo", "bark", "bay", "beach", "bee", "birch", "bird", "bloom",
    "blossom", "bough", "branch", "breeze", "brook", "bud", "butterfly", "canyon", "cedar",
    "cherry", "chrysanthemum", "cicada", "cliff", "cloud", "clouds", "cove", "crane", "creek",
    "crow", "dawn", "dew", "dragonfly", "dune", "dusk", "earth", "ember", "evening", "fern",
    "field", "fields", "fir", "firefly", "flower", "flowers", "fog", "forest", "frog", "frost",
    "garden", "glen", "grass", "grove", "hail", "harvest", "hawk", "heron", "hill", "hills",
    "horizon", "ice", "iris", "ivy", "lake", "leaf", "leaves", "lightning", "lily", "lotus",
    "maple", "marsh", "meadow", "mist", "moon", "moonlight", "moss", "mountain", "mountains",
    "nest", "night", "oak", "ocean", "orchard", "owl", "peak", "pebble", "petal", "petals",
    "pine", "plum", "pond", "rain", "rainbow", "raven", "reed", "river", "rock", "rose", "sand",
    "sea", "seed", "shore", "sky", "snow", "snowflake", "spring", "star", "stars", "stone",
    "storm", "stream", "summer", "sun", "sunlight", "sunrise", "sunset", "swallow", "swan",
    "thunder", "tide", "tree", "trees", "twilight", "valley", "vine", "violet", "wave", "waves",
    "weed", "wheat", "willow", "wind", "winter", "wood", "woods",
];

/// Concrete sight, sound, touch, taste, and smell words.
pub const SENSORY_WORDS: &[&str] = &[
    "bitter", "bright", "chill", "cold", "cool", "crimson", "crisp", "damp", "dark", "dim",
    "dry", "dusty", "echo", "fragrant", "fresh", "frozen", "glimmer", "glitter", "glow", "gold",
    "golden", "gray", "green", "grey", "hum", "hush", "icy", "loud", "moist", "murmur", "pale",
    "pungent", "quiet", "red", "rough", "rustle", "salt", "scarlet", "scent", "shadow", "sharp",
    "shimmer", "silent", "silver", "smell", "smoke", "smooth", "soft", "sour", "sparkle",
    "sticky", "still", "sweet", "tender", "thick", "thin", "thunder", "velvet", "warm", "wet",
    "whisper", "white", "wild", "yellow",
];

/// Frequent given names in public-domain fiction, lower-cased.
pub const COMMON_NAMES: &[&str] = &[
    "adam", "agnes", "alice", "amelia", "ann", "anna", "anne", "arthur", "bella", "ben",
    "bertha", "betsy", "catherine", "charles", "charlotte", "clara", "david", "dick", "dora",
    "edith", "edmund", "edward", "eliza", "elizabeth", "ellen", "emily", "emma", "esther",
    "fanny", "frank", "fred", "george", "grace", "hannah", "harriet", "harry", "helen", "henry",
    "jack", "james", "jane", "jenny", "jim", "joe", "john", "joseph", "julia", "kate", "laura",
    "lizzie", "louisa", "lucy", "margaret", "maria", "marianne", "martha", "mary", "matthew",
    "meg", "michael", "nancy", "ned", "oliver", "paul", "peter", "philip", "polly", "rachel",
    "richard", "robert", "ruth", "sam", "samuel", "sarah", "sophia", "susan", "thomas", "tom",
    "walter", "william",
];

/// Words with positive valence.
pub const POSITIVE_WORDS: &[&str] = &[
    "beautiful", "beauty", "bless", "blessed", "bliss", "bloom", "bright", "calm", "charm",
    "cheer", "content", "dear", "delight", "dream", "free", "gentle", "glad", "glory", "golden",
    "good", "grace", "happy", "harmony", "heal", "heaven", "hope", "joy", "kind", "laugh",
    "light", "love", "lovely", "merry", "mild", "peace", "peaceful", "pleasant", "pure", "rest",
    "serene", "shine", "smile", "soft", "sweet", "tender", "true", "warm", "wonder",
];

/// Words with negative valence.
pub const NEGATIVE_WORDS: &[&str] = &[
    "afraid", "alone", "anger", "angry", "bitter", "blood", "broken", "cold", "cruel", "cry",
    "dark", "dead", "death", "despair", "dread", "dull", "evil", "fear", "fury", "grief",
    "grim", "guilt", "hate", "hurt", "ill", "kill", "lonely", "lost", "mourn", "pain", "poor",
    "rage", "sad", "scream", "sick", "sin", "sorrow", "tear", "tears", "terror", "ugly",
    "weary", "weep", "wicked", "woe", "wound", "wrong",
];

/// Common verbs, including irregular past forms, that suffix rules miss.
pub const COMMON_VERBS: &[&str] = &[
    "am", "are", "arise", "ask", "be", "became", "become", "began", "begin", "blew", "bloom",
    "blow", "born", "bow", "break", "bring", "broke", "brought", "burn", "call", "came", "can",
    "carry", "catch", "caught", "climb", "come", "could", "cried", "cry", "dance", "did", "die",
    "do", "does", "drank", "dream", "drew", "drift", "drink", "drive", "drop", "eat", "fall",
    "feel", "fell", "felt", "find", "flew", "flow", "fly", "found", "gave", "get", "give", "go",
    "goes", "gone", "grew", "grow", "had", "has", "have", "hear", "heard", "held", "hide",
    "hold", "hum", "is", "keep", "kept", "knew", "know", "laid", "lay", "lead", "lean", "leave",
    "left", "let", "lie", "lies", "lift", "like", "listen", "live", "look", "lost", "love",
    "made", "make", "may", "might", "move", "must", "rain", "ran", "rang", "reach", "read",
    "rest", "ride", "ring", "rise", "rose", "run", "sang", "sat", "saw", "say", "see", "seem",
    "seen", "sees", "shake", "shall", "shine", "shone", "should", "sing", "sit", "sleep",
    "slept", "smile", "sounds", "spoke", "stand", "stay", "stood", "stop", "swim", "take",
    "taught", "tell", "think", "thought", "threw", "throw", "took", "touch", "turn", "wait",
    "wake", "walk", "want", "was", "watch", "went", "were", "will", "wish", "woke", "would",
    "write", "wrote",
];

/// Common adjectives without a telltale suffix.
pub const COMMON_ADJECTIVES: &[&str] = &[
    "bare", "big", "black", "blue", "bold", "brave", "brief", "broad", "calm", "clear", "cold",
    "cool", "dark", "deep", "dim", "distant", "empty", "faint", "far", "fine", "free", "full",
    "gentle", "grand", "gray", "great", "green", "grey", "high", "hollow", "hot", "late",
    "lone", "long", "lost", "low", "new", "old", "pale", "proud", "quick", "quiet", "rich",
    "sad", "short", "silent", "slow", "small", "soft", "still", "strange", "strong", "sweet",
    "tall", "thin", "tiny", "warm", "white", "whole", "wide", "wild", "young",
];

/// Determiners, pronouns, prepositions, and conjunctions.
pub const FUNCTION_WORDS: &[&str] = &[
    "a", "about", "above", "after", "against", "all", "along", "also", "although", "among",
    "an", "and", "any", "around", "as", "at", "because", "before", "behind", "below", "beneath",
    "beside", "between", "beyond", "both", "but", "by", "down", "during", "each", "either",
    "even", "ever", "every", "few", "for", "from", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "neither", "never", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "onto", "or", "our", "ours", "out", "over", "own", "same",
    "she", "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "then",
    "there", "these", "they", "this", "those", "though", "through", "thus", "till", "to", "too",
    "toward", "under", "until", "up", "upon", "us", "very", "was", "we", "were", "what", "when",
    "where", "whether", "which", "while", "who", "whom", "whose", "why", "with", "within",
    "without", "yet", "you", "your", "yours",
];

/// Binary-search membership test against one of the sorted tables above.
pub fn contains(table: &[&str], word: &str) -> bool {
    table.binary_search(&word).is_ok()
}

/// Look up a hand-corrected syllable count.
pub fn syllable_exception(word: &str) -> Option<u32> {
    SYLLABLE_EXCEPTIONS
        .binary_search_by(|(w, _)| (*w).cmp(word))
        .ok()
        .map(|i| SYLLABLE_EXCEPTIONS[i].1)
}
