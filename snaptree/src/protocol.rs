//! Wire-level code enumerations.
//!
//! Fixed integer codes exchanged between client and server. The tree layer
//! neither produces nor consumes them; they live here so every layer of the
//! engine shares one definition.
//!
//! Each enum converts from its wire code with `TryFrom<i32>`, handing back
//! the unknown code on failure, and to it with `i32::from`.

/// Define a wire enum with its `TryFrom<i32>` and `From<Self> for i32`.
macro_rules! wire_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $code:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $code,)*
        }

        impl TryFrom<i32> for $name {
            type Error = i32;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $($code => Ok(Self::$variant),)*
                    _ => Err(value),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(code: $name) -> Self {
                code as Self
            }
        }
    };
}

wire_codes! {
    /// Client-to-server operations.
    pub enum Protocol {
        Eof = -1,
        ExecuteNonQuery = 2,
        SkipRows = 3,
        GetRow = 4,
        CloseReader = 5,
        BeginTransaction = 6,
        Commit = 7,
        Rollback = 8,
        CloseConnection = 9,
        GetFileNames = 10,
        Prepare = 11,
        Request = 12,
        Authority = 13,
        ResetReader = 14,
        Detach = 15,
        ReaderData = 16,
        Fetch = 17,
        DataWrite = 18,
        TypeInfo = 19,
        GetSchema = 20,
        ExecuteReader = 21,
        RemoteBegin = 22,
        Mark = 23,
        DbGet = 24,
        DbSet = 25,
        Physical = 26,
        GetMaster = 27,
        ExecuteReaderCrypt = 28,
        DirectServers = 29,
        RePartition = 30,
        RemoteCommit = 31,
        CheckConflict = 32,
        Get = 33,
        CheckSerialisation = 34,
        IndexLookup = 35,
        CheckSchema = 36,
        GetTable = 37,
        IndexNext = 38,
        ExecuteNonQueryCrypt = 39,
        TableNext = 40,
        Mongo = 41,
        Check = 42,
        CommitAndReport = 43,
        RemoteCommitAndReport = 44,
        Post = 45,
        Put = 46,
        GetOne = 47,
        Delete = 48,
        Update = 49,
        Rest = 50,
    }
}

wire_codes! {
    /// Server-to-client response kinds.
    pub enum Responses {
        Acknowledged = 0,
        OobException = 1,
        ReaderData = 10,
        Done = 11,
        Exception = 12,
        Schema = 13,
        CellData = 14,
        NoData = 15,
        FatalError = 16,
        TransactionConflict = 17,
        Files = 18,
        RePartition = 30,
        Fetching = 42,
        Written = 43,
        SchemaSegment = 44,
        Master = 45,
        NoMaster = 46,
        Servers = 47,
        IndexCursor = 48,
        LastSchema = 49,
        TableCursor = 50,
        IndexData = 51,
        IndexDone = 52,
        TableData = 53,
        TableDone = 54,
        Prepare = 55,
        Request = 56,
        Committed = 57,
        Serialisable = 58,
        Primary = 60,
        Secondary = 61,
        Begin = 62,
        Valid = 63,
        Invalid = 64,
        TransactionReport = 65,
        RemoteTransactionReport = 66,
        PostReport = 67,
        Warning = 68,
        TransactionReason = 69,
    }
}

wire_codes! {
    /// Fields of the connection string.
    ///
    /// `User`, `Password`, `Base`, `BaseServer`, `Coordinator` and `Length`
    /// are reserved for server-to-server connections.
    pub enum Connecting {
        Password = 20,
        User = 21,
        Files = 22,
        Role = 23,
        Done = 24,
        Stop = 25,
        Host = 26,
        Key = 27,
        Details = 28,
        Base = 29,
        Coordinator = 30,
        BaseServer = 31,
        Modify = 32,
        Length = 33,
    }
}
