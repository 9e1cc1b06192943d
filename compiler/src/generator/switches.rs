use serde::Serialize;

/// The operation families a backend can be asked to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    Size,
    Serialize,
    Deserialize,
    /// Encode a whole struct into a fresh byte vector.
    Wrap,
    /// Decode a whole struct from a byte slice.
    Unwrap,
    ReadStream,
    WriteStream,
    Print,
    Create,
    /// Overwrite every member of an existing struct.
    Set,
    Copy,
    Dup,
    Clear,
    Destroy,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Operation::Size,
        Operation::Serialize,
        Operation::Deserialize,
        Operation::Wrap,
        Operation::Unwrap,
        Operation::ReadStream,
        Operation::WriteStream,
        Operation::Print,
        Operation::Create,
        Operation::Set,
        Operation::Copy,
        Operation::Dup,
        Operation::Clear,
        Operation::Destroy,
    ];

    /// Operations that only make sense for structs, whose members double as
    /// parameters.
    pub fn struct_only(self) -> bool {
        matches!(self, Operation::Wrap | Operation::Unwrap | Operation::Create | Operation::Set)
    }
}

/// Which operation families to generate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Switches {
    pub size:         bool,
    pub serialize:    bool,
    pub deserialize:  bool,
    pub wrap:         bool,
    pub unwrap:       bool,
    pub read_stream:  bool,
    pub write_stream: bool,
    pub print:        bool,
    pub create:       bool,
    pub set:          bool,
    pub copy:         bool,
    pub dup:          bool,
    pub clear:        bool,
    pub destroy:      bool,
}

impl Switches {
    pub fn all() -> Switches {
        Switches {
            size:         true,
            serialize:    true,
            deserialize:  true,
            wrap:         true,
            unwrap:       true,
            read_stream:  true,
            write_stream: true,
            print:        true,
            create:       true,
            set:          true,
            copy:         true,
            dup:          true,
            clear:        true,
            destroy:      true,
        }
    }

    /// Applies the implications between operations. Wrapping and writing
    /// to a stream pack, unwrapping unpacks. Create, set and dup copy, and
    /// both copy and destroy start by clearing.
    pub fn resolve(mut self) -> Switches {
        if self.wrap || self.write_stream {
            self.serialize = true;
        }
        if self.unwrap {
            self.deserialize = true;
        }
        if self.create || self.set || self.dup {
            self.copy = true;
        }
        if self.copy || self.destroy {
            self.clear = true;
        }
        self
    }

    pub fn is_enabled(&self, operation: Operation) -> bool {
        match operation {
            Operation::Size        => self.size,
            Operation::Serialize   => self.serialize,
            Operation::Deserialize => self.deserialize,
            Operation::Wrap        => self.wrap,
            Operation::Unwrap      => self.unwrap,
            Operation::ReadStream  => self.read_stream,
            Operation::WriteStream => self.write_stream,
            Operation::Print       => self.print,
            Operation::Create      => self.create,
            Operation::Set         => self.set,
            Operation::Copy        => self.copy,
            Operation::Dup         => self.dup,
            Operation::Clear       => self.clear,
            Operation::Destroy     => self.destroy,
        }
    }

    /// Enabled operations after resolution, in canonical order.
    pub fn operations(&self) -> Vec<Operation> {
        let resolved = self.resolve();
        Operation::ALL
            .into_iter()
            .filter(|operation| resolved.is_enabled(*operation))
            .collect()
    }
}
